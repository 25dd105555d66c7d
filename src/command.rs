use std::sync::Arc;

use crate::audit::AuditSink;
use crate::lang::Lang;

pub type Context<'a> = poise::Context<'a, Data, eyre::Report>;

pub struct Data {
    pub lang: Lang,
    pub audit: Arc<dyn AuditSink>,
}

pub fn all() -> Vec<poise::Command<Data, eyre::Report>> {
    vec![crate::purge::command::purge()]
}
