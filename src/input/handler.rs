//! Executes parsed commands against an editor session.

use anyhow::{anyhow, Result};
use tracing::debug;

use super::command::{SessionCommand, StepPath, HELP};
use crate::document::content::{DataReference, ExperimentInfo, Note, ParamKind, ParamValue, Parameter};
use crate::document::tree::StepId;
use crate::editor::session::EditorSession;
use crate::ui::outline::render_outline;
use crate::view::{RecordingView, ViewAdapter};

/// What the driver should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Print this message and keep reading
    Message(String),
    /// Leave the editor
    Quit,
}

/// Builds a parameter from command-line words. The kind follows the parsed
/// values when they all agree; mixed or empty lists are kept as text.
pub fn parameter_from_words(name: &str, values: &[String]) -> Parameter {
    let parsed: Vec<ParamValue> = values.iter().map(|v| ParamValue::parse(v)).collect();
    let kind = if parsed.is_empty() {
        None
    } else if parsed.iter().all(|v| matches!(v, ParamValue::Number(_))) {
        Some(ParamKind::Number { units: None })
    } else if parsed.iter().all(|v| matches!(v, ParamValue::Boolean(_))) {
        Some(ParamKind::Boolean)
    } else {
        None
    };
    match kind {
        Some(kind) => Parameter::new(name, kind).with_values(parsed),
        None => Parameter::new(name, ParamKind::Text)
            .with_values(values.iter().map(|v| ParamValue::Text(v.clone()))),
    }
}

/// Runs session commands.
///
/// The handler keeps no state of its own; the selection lives in the
/// session's [`RecordingView`].
#[derive(Debug, Default)]
pub struct CommandHandler;

impl CommandHandler {
    pub fn new() -> Self {
        Self
    }

    fn resolve(&self, session: &EditorSession<RecordingView>, path: &StepPath) -> Result<StepId> {
        session
            .document()
            .find_by_path(path)
            .ok_or_else(|| anyhow!("no step at path {}", display_path(path)))
    }

    /// Executes `command`. Edit failures are returned as errors; actions that
    /// do not apply in the current state produce a "nothing to do" message.
    pub fn execute(
        &mut self,
        command: SessionCommand,
        session: &mut EditorSession<RecordingView>,
    ) -> Result<Reply> {
        debug!(?command, "executing command");
        let changed = match command {
            SessionCommand::Quit => return Ok(Reply::Quit),
            SessionCommand::Help => return Ok(Reply::Message(HELP.to_string())),
            SessionCommand::Show => {
                let selection = session.view().selected_steps();
                return Ok(Reply::Message(render_outline(session.document(), &selection)));
            }
            SessionCommand::Select(paths) => {
                let steps = paths
                    .iter()
                    .map(|path| self.resolve(session, path))
                    .collect::<Result<Vec<_>>>()?;
                let count = steps.len();
                session.view_mut().select(steps);
                return Ok(Reply::Message(format!("{} step(s) selected", count)));
            }
            SessionCommand::Undo => {
                let label = session.undo_label();
                return Ok(Reply::Message(match (label, session.undo()?) {
                    (Some(label), true) => format!("Undid {}", label),
                    _ => "Nothing to undo".to_string(),
                }));
            }
            SessionCommand::Redo => {
                let label = session.redo_label();
                return Ok(Reply::Message(match (label, session.redo()?) {
                    (Some(label), true) => format!("Redid {}", label),
                    _ => "Nothing to redo".to_string(),
                }));
            }

            SessionCommand::Add(name) => session.add_step(name)?,
            SessionCommand::Split { path, at, name } => {
                let step = self.resolve(session, &path)?;
                session.split_step(step, at, name)?
            }
            SessionCommand::Indent => session.indent_right()?,
            SessionCommand::Outdent => session.indent_left()?,
            SessionCommand::Up => session.move_up()?,
            SessionCommand::Down => session.move_down()?,
            SessionCommand::Delete => session.delete_selected()?,
            SessionCommand::Rename { path, name } => {
                let step = self.resolve(session, &path)?;
                session.rename_step(step, name)?
            }
            SessionCommand::Text { path, text } => {
                let step = self.resolve(session, &path)?;
                session.add_text(step, text)?
            }
            SessionCommand::Param { path, name, values } => {
                let step = self.resolve(session, &path)?;
                session.add_parameter(step, parameter_from_words(&name, &values))?
            }
            SessionCommand::Unparam { path, index } => {
                let step = self.resolve(session, &path)?;
                session.remove_content(step, index)?
            }
            SessionCommand::Note { path, text } => {
                let step = self.resolve(session, &path)?;
                let name = format!("Note {}", session.document().step(step)?.note_count() + 1);
                session.add_note(step, Note::new(name, text))?
            }
            SessionCommand::Unnote { path, index } => {
                let step = self.resolve(session, &path)?;
                session.remove_note(step, index)?
            }
            SessionCommand::Link {
                path,
                name,
                target,
                mime_type,
            } => {
                let step = self.resolve(session, &path)?;
                let mut data_ref = DataReference::new(name, target);
                if let Some(mime_type) = mime_type {
                    data_ref = data_ref.with_mime_type(mime_type);
                }
                session.add_data_ref(step, data_ref)?
            }
            SessionCommand::Unlink { path, index } => {
                let step = self.resolve(session, &path)?;
                session.remove_data_ref(step, index)?
            }
            SessionCommand::ClearValues => session.clear_all_values()?,
            SessionCommand::Experiment(investigator) => {
                let info = match investigator {
                    Some(name) => ExperimentInfo::with_investigator(name),
                    None => ExperimentInfo::new(),
                };
                session.add_experiment_info(info)?
            }
            SessionCommand::Template => session.remove_experiment_info()?,
            SessionCommand::Table(path) => {
                let step = self.resolve(session, &path)?;
                session.attach_value_table(step)?
            }
            SessionCommand::Untable(path) => {
                let step = self.resolve(session, &path)?;
                session.detach_value_table(step)?
            }
        };

        Ok(Reply::Message(if changed {
            session.undo_label().unwrap_or("Done").to_string()
        } else {
            "Nothing to do".to_string()
        }))
    }
}

fn display_path(path: &[usize]) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}
