//! Parsing of line commands typed into the interactive driver.
//!
//! Steps are addressed by paths of child indices from the root, written with
//! dots (`0.2.1`). An empty path, `.` or `/` is the root.

use thiserror::Error;

/// Errors produced while parsing a command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),
    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: String,
        argument: &'static str,
    },
    #[error("invalid step path '{0}'")]
    InvalidPath(String),
    #[error("invalid index '{0}'")]
    InvalidIndex(String),
}

/// Path of child indices from the root.
pub type StepPath = Vec<usize>;

/// A parsed user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Add(Option<String>),
    Select(Vec<StepPath>),
    Split {
        path: StepPath,
        at: usize,
        name: Option<String>,
    },
    Indent,
    Outdent,
    Up,
    Down,
    Delete,
    Rename {
        path: StepPath,
        name: Option<String>,
    },
    Text {
        path: StepPath,
        text: String,
    },
    Param {
        path: StepPath,
        name: String,
        values: Vec<String>,
    },
    Unparam {
        path: StepPath,
        index: usize,
    },
    Note {
        path: StepPath,
        text: String,
    },
    Unnote {
        path: StepPath,
        index: usize,
    },
    Link {
        path: StepPath,
        name: String,
        target: String,
        mime_type: Option<String>,
    },
    Unlink {
        path: StepPath,
        index: usize,
    },
    ClearValues,
    Experiment(Option<String>),
    Template,
    Table(StepPath),
    Untable(StepPath),
    Undo,
    Redo,
    Show,
    Help,
    Quit,
}

/// Parses a step path such as `0.2`.
pub fn parse_path(input: &str) -> Result<StepPath, ParseError> {
    if input.is_empty() || input == "." || input == "/" {
        return Ok(Vec::new());
    }
    input
        .split('.')
        .map(|part| {
            part.parse::<usize>()
                .map_err(|_| ParseError::InvalidPath(input.to_string()))
        })
        .collect()
}

fn parse_index(input: &str) -> Result<usize, ParseError> {
    input
        .parse::<usize>()
        .map_err(|_| ParseError::InvalidIndex(input.to_string()))
}

struct Args<'a> {
    command: &'a str,
    words: std::str::SplitWhitespace<'a>,
}

impl<'a> Args<'a> {
    fn required(&mut self, argument: &'static str) -> Result<&'a str, ParseError> {
        self.words.next().ok_or_else(|| self.missing(argument))
    }

    fn path(&mut self) -> Result<StepPath, ParseError> {
        parse_path(self.required("a step path")?)
    }

    fn index(&mut self) -> Result<usize, ParseError> {
        parse_index(self.required("an index")?)
    }

    /// Everything left on the line, joined by single spaces.
    fn rest(&mut self) -> Option<String> {
        let rest: Vec<&str> = self.words.by_ref().collect();
        if rest.is_empty() {
            None
        } else {
            Some(rest.join(" "))
        }
    }

    fn required_rest(&mut self, argument: &'static str) -> Result<String, ParseError> {
        self.rest().ok_or_else(|| self.missing(argument))
    }

    fn missing(&self, argument: &'static str) -> ParseError {
        ParseError::MissingArgument {
            command: self.command.to_string(),
            argument,
        }
    }
}

/// Parses one input line. Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<SessionCommand>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(None);
    };
    let mut args = Args {
        command: word,
        words,
    };

    let parsed = match word {
        "add" => SessionCommand::Add(args.rest()),
        "select" => {
            let mut paths = Vec::new();
            for word in args.words.by_ref() {
                paths.push(parse_path(word)?);
            }
            SessionCommand::Select(paths)
        }
        "split" => SessionCommand::Split {
            path: args.path()?,
            at: args.index()?,
            name: args.rest(),
        },
        "indent" => SessionCommand::Indent,
        "outdent" => SessionCommand::Outdent,
        "up" => SessionCommand::Up,
        "down" => SessionCommand::Down,
        "delete" => SessionCommand::Delete,
        "rename" => SessionCommand::Rename {
            path: args.path()?,
            name: args.rest(),
        },
        "text" => SessionCommand::Text {
            path: args.path()?,
            text: args.required_rest("some text")?,
        },
        "param" => SessionCommand::Param {
            path: args.path()?,
            name: args.required("a parameter name")?.to_string(),
            values: args.words.by_ref().map(str::to_string).collect(),
        },
        "unparam" => SessionCommand::Unparam {
            path: args.path()?,
            index: args.index()?,
        },
        "note" => SessionCommand::Note {
            path: args.path()?,
            text: args.required_rest("some text")?,
        },
        "unnote" => SessionCommand::Unnote {
            path: args.path()?,
            index: args.index()?,
        },
        "link" => SessionCommand::Link {
            path: args.path()?,
            name: args.required("a name")?.to_string(),
            target: args.required("a target")?.to_string(),
            mime_type: args.words.next().map(str::to_string),
        },
        "unlink" => SessionCommand::Unlink {
            path: args.path()?,
            index: args.index()?,
        },
        "clear-values" => SessionCommand::ClearValues,
        "experiment" => SessionCommand::Experiment(args.rest()),
        "template" => SessionCommand::Template,
        "table" => SessionCommand::Table(args.path()?),
        "untable" => SessionCommand::Untable(args.path()?),
        "undo" | "u" => SessionCommand::Undo,
        "redo" | "r" => SessionCommand::Redo,
        "show" | "ls" => SessionCommand::Show,
        "help" | "?" => SessionCommand::Help,
        "quit" | "exit" | "q" => SessionCommand::Quit,
        _ => return Err(ParseError::UnknownCommand(word.to_string())),
    };
    Ok(Some(parsed))
}

/// Short reference shown by the `help` command.
pub const HELP: &str = "\
add [name]                   add a step after the selection
select <path>...             select steps (e.g. 'select 0.1 0.2')
split <path> <at> [name]     split a step's body before item <at>
indent | outdent             indent / outdent the selection
up | down                    move the selection
delete                       delete the selection
rename <path> [name]         rename a step (no name clears it)
text <path> <text>           append free text
param <path> <name> [v...]   append a parameter with values
unparam <path> <index>       delete a content item
note <path> <text>           add a note
unnote <path> <index>        remove a note
link <path> <name> <target> [mime]  add a data reference
unlink <path> <index>        remove a data reference
clear-values                 clear every parameter value
experiment [investigator]    mark the document as a run
template                     revert a run to a template
table <path> | untable <path>  attach / detach a value table
undo | redo                  step through history
show                         print the outline
quit                         leave";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_paths() {
        assert_eq!(parse_path(".").unwrap(), Vec::<usize>::new());
        assert_eq!(parse_path("0.2.1").unwrap(), vec![0, 2, 1]);
        assert_eq!(
            parse_path("0.x"),
            Err(ParseError::InvalidPath("0.x".to_string()))
        );
    }

    #[test]
    fn test_blank_and_comment_lines() {
        assert_eq!(parse_command("   ").unwrap(), None);
        assert_eq!(parse_command("# setup").unwrap(), None);
    }

    #[test]
    fn test_add_with_multiword_name() {
        assert_eq!(
            parse_command("add Wash in PBS").unwrap(),
            Some(SessionCommand::Add(Some("Wash in PBS".to_string())))
        );
        assert_eq!(parse_command("add").unwrap(), Some(SessionCommand::Add(None)));
    }

    #[test]
    fn test_split_arguments() {
        assert_eq!(
            parse_command("split 1 2 Mix").unwrap(),
            Some(SessionCommand::Split {
                path: vec![1],
                at: 2,
                name: Some("Mix".to_string())
            })
        );
        assert_eq!(
            parse_command("split 1"),
            Err(ParseError::MissingArgument {
                command: "split".to_string(),
                argument: "an index"
            })
        );
    }

    #[test]
    fn test_param_values() {
        assert_eq!(
            parse_command("param 0 Volume 1 2").unwrap(),
            Some(SessionCommand::Param {
                path: vec![0],
                name: "Volume".to_string(),
                values: vec!["1".to_string(), "2".to_string()],
            })
        );
    }

    #[test]
    fn test_select_many() {
        assert_eq!(
            parse_command("select 0.1 0.2").unwrap(),
            Some(SessionCommand::Select(vec![vec![0, 1], vec![0, 2]]))
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse_command("frobnicate 1 2"),
            Err(ParseError::UnknownCommand("frobnicate".to_string()))
        );
    }

    #[test]
    fn test_link_with_mime_type() {
        assert_eq!(
            parse_command("link 0 gel gel.tif image/tiff").unwrap(),
            Some(SessionCommand::Link {
                path: vec![0],
                name: "gel".to_string(),
                target: "gel.tif".to_string(),
                mime_type: Some("image/tiff".to_string()),
            })
        );
    }
}
