//! Command-line parser.
//!
//! Tokens are separated by whitespace. `>` redirects output (truncate),
//! `>>` redirects output (append), `<` redirects input, `|` separates
//! pipeline stages, and a trailing `&` backgrounds the whole pipeline.
//! Quoting, globbing, and variable expansion are not handled here.

/// One pipeline stage. Purely structural; the executor only reads it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Command {
    /// Program name followed by its arguments. Empty means a no-op stage.
    pub args: Vec<String>,
    /// Input redirection, honored only on the first stage of a pipeline.
    pub input_file: Option<String>,
    /// Output redirection, honored only on the last stage of a pipeline.
    pub output_file: Option<String>,
    /// Open `output_file` for append instead of truncating.
    pub append_output: bool,
    /// Set by a `&` token; meaningful only for a sole-stage pipeline.
    pub background: bool,
}

/// An ordered chain of commands whose adjacent standard streams are
/// connected by pipes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pipeline {
    /// The raw trimmed command line, kept for job display.
    pub input: String,
    pub commands: Vec<Command>,
    /// Set when the raw line ends in `&`.
    pub background: bool,
}

/// Parses a single pipeline stage.
///
/// A redirection operator consumes whatever token follows it as the
/// filename, even if that token is itself an operator; an operator at the
/// end of the line is dropped. Repeated redirections follow last-token-wins
/// semantics. These quirks are deliberate parser behavior, preserved as-is.
pub fn parse_command(segment: &str) -> Command {
    let tokens: Vec<&str> = segment.split_whitespace().collect();
    let mut command = Command::default();

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            ">" => {
                if i + 1 < tokens.len() {
                    command.output_file = Some(tokens[i + 1].to_string());
                    command.append_output = false;
                    i += 1;
                }
            }
            ">>" => {
                if i + 1 < tokens.len() {
                    command.output_file = Some(tokens[i + 1].to_string());
                    command.append_output = true;
                    i += 1;
                }
            }
            "<" => {
                if i + 1 < tokens.len() {
                    command.input_file = Some(tokens[i + 1].to_string());
                    i += 1;
                }
            }
            "&" => command.background = true,
            token => command.args.push(token.to_string()),
        }
        i += 1;
    }

    command
}

/// Parses a full command line into a `Pipeline`.
///
/// A trailing `&` is stripped and recorded as the pipeline's background
/// flag before the line is split on `|`. Empty segments between pipes are
/// skipped.
pub fn parse_pipeline(line: &str) -> Pipeline {
    let mut line = line.trim();
    if line.is_empty() {
        return Pipeline::default();
    }

    let mut pipeline = Pipeline {
        input: line.to_string(),
        ..Default::default()
    };

    if let Some(stripped) = line.strip_suffix('&') {
        pipeline.background = true;
        line = stripped.trim();
    }

    for segment in line.split('|') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        pipeline.commands.push(parse_command(segment));
    }

    pipeline
}
