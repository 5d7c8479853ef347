// src/rules/mod.rs

//! Rule table and path matching.
//!
//! A rule binds a [`Pattern`] over project-relative paths to a handler. The
//! scanner and the watcher feed every file through [`RuleTable::matches`];
//! handlers typically enqueue tasks through their [`RuleContext`].

pub mod from_config;
pub mod pattern;
pub mod table;

pub use from_config::{build_rule_table, TemplateVars};
pub use pattern::{PathMatch, Pattern};
pub use table::{Rule, RuleContext, RuleFn, RuleTable};
