//! Procedural (`*`) command execution

use std::fs;

use tracing::debug;

use super::{Flow, SqlFile};
use crate::block::BlockKind;
use crate::commands::pl::{self, PlCommand};
use crate::error::{SqlToolError, SqlToolResult};
use crate::expr::eval;
use crate::session::{FetchTarget, PrepareSource};
use crate::token::Token;

/// How a loop reacts to the flow left by one pass of its body
enum Pass {
    Next,
    Exit,
    Leave(Flow),
}

fn loop_pass(flow: Flow, kind: BlockKind) -> Pass {
    match flow {
        Flow::Normal | Flow::Continue(None) => Pass::Next,
        Flow::Continue(Some(k)) if k == kind => Pass::Next,
        Flow::Break(None) => Pass::Exit,
        Flow::Break(Some(k)) if k == kind => Pass::Exit,
        other => Pass::Leave(other),
    }
}

fn body(token: &Token) -> SqlToolResult<&[Token]> {
    token
        .nested_block
        .as_deref()
        .ok_or_else(|| SqlToolError::Internal(format!("block without a body: {}", token.value)))
}

impl<'s, 't> SqlFile<'s, 't> {
    pub(super) fn run_pl(&mut self, token: &Token) -> SqlToolResult<Flow> {
        let command = pl::parse(&token.value)?;
        debug!("PL command: {:?}", command);
        self.session.pl_mode = true;

        match command {
            PlCommand::Enable => self.session.notify("pl.enabled", &[])?,
            PlCommand::Help => {
                let text = self.session.message("help.pl", &[]);
                self.session.print(&text)?;
            }
            PlCommand::If(expr) => {
                let body = body(token)?;
                if self.test(&expr)? {
                    return match self.run_block(body)? {
                        Flow::Break(None) | Flow::Break(Some(BlockKind::If)) => Ok(Flow::Normal),
                        flow => Ok(flow),
                    };
                }
            }
            PlCommand::While(expr) => {
                let body = body(token)?;
                while self.test(&expr)? {
                    match loop_pass(self.run_block(body)?, BlockKind::While) {
                        Pass::Next => {}
                        Pass::Exit => break,
                        Pass::Leave(flow) => return Ok(flow),
                    }
                }
            }
            PlCommand::Foreach { var, values } => {
                let body = body(token)?;
                let values = self.session.vars.dereference(&values, false)?;
                let prior = self.session.vars.get(&var).map(str::to_string);
                let result = self.run_foreach(&var, &values, body);
                match prior {
                    Some(value) => self.session.vars.set(&var, value),
                    None => {
                        self.session.vars.remove(&var);
                    }
                }
                return result;
            }
            PlCommand::End(rest) => {
                return Err(SqlToolError::BadPlCommand {
                    command: format!("end {}", rest).trim_end().to_string(),
                    reason: "no block is open".to_string(),
                })
            }
            PlCommand::Break(kind) => return Ok(Flow::Break(kind)),
            PlCommand::Continue(kind) => return Ok(Flow::Continue(kind)),
            PlCommand::List { names, values } => self.list_vars(&names, values)?,
            PlCommand::Dump { var, file } => {
                let file = self.session.vars.dereference(&file, false)?;
                let value = self
                    .session
                    .vars
                    .get(&var)
                    .ok_or_else(|| SqlToolError::UndefinedVariable(var.clone()))?;
                fs::write(&file, value)?;
                self.session.notify("var.dumped", &[&var, &file])?;
            }
            PlCommand::Load { var, file } => {
                let file = self.session.vars.dereference(&file, false)?;
                let value = fs::read_to_string(&file)?;
                self.session.vars.set(&var, value);
                self.session.notify("var.loaded", &[&var, &file])?;
            }
            PlCommand::Prepare(var) => {
                self.session.prepare = Some(PrepareSource::Variable(var));
            }
            PlCommand::Set { var, value } => {
                let value = self.session.vars.dereference(&value, false)?;
                self.session.vars.set(&var, value);
            }
            PlCommand::Unset(var) => {
                self.session.vars.remove(&var);
            }
            PlCommand::Fetch { var, silent } => {
                self.session.fetch_var = Some(FetchTarget { name: var, silent });
            }
        }
        Ok(Flow::Normal)
    }

    fn test(&self, expr: &str) -> SqlToolResult<bool> {
        let vars = &self.session.vars;
        eval(&vars.dereference(expr, false)?, vars)
    }

    fn run_foreach(&mut self, var: &str, values: &str, body: &[Token]) -> SqlToolResult<Flow> {
        for value in values.split_whitespace() {
            self.session.vars.set(var, value);
            match loop_pass(self.run_block(body)?, BlockKind::Foreach) {
                Pass::Next => {}
                Pass::Exit => break,
                Pass::Leave(flow) => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn list_vars(&mut self, names: &[String], values: bool) -> SqlToolResult<()> {
        let mut lines: Vec<String> = if names.is_empty() {
            self.session
                .vars
                .iter()
                .map(|(name, value)| (name.to_string(), Some(value.to_string())))
                .collect::<Vec<_>>()
        } else {
            names
                .iter()
                .map(|name| {
                    let value = self.session.vars.get(name).map(str::to_string);
                    (name.clone(), value)
                })
                .collect()
        }
        .into_iter()
        .map(|(name, value)| match (values, value) {
            (true, Some(value)) => format!("{} = {}", name, value),
            (true, None) => format!("{} is not set", name),
            (false, _) => name,
        })
        .collect();

        if lines.is_empty() {
            return self.session.notify("vars.none", &[]);
        }
        if names.is_empty() {
            lines.sort();
        }
        for line in lines {
            self.session.print(&line)?;
        }
        Ok(())
    }
}
