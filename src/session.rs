//! Line-oriented command session: one command per input line, plain text
//! replies on the writer.

use crate::{
    error::{Result, StudioError},
    models::{parse_number, Sampler, Style, PRESET_SIZES},
    state::{RequestStatus, StudioState},
    studio::Studio,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

pub const HELP: &str = "\
commands:
  prompt <text>       set the prompt
  ratio <id|custom>   pick a preset ratio or switch to custom size
  custom              switch to custom size, keeping the numbers
  width <n>           set the width
  height <n>          set the height
  style <key>         realistic | anime | oil | watercolor
  seed <n>            set the seed
  steps <n>           set the sampling steps
  cfg <x>             set the cfg scale
  sampler <name>      euler_a | euler | lms | heun | dpm2 | dpm2_a
  show                print the current selections
  url                 print the request url without generating
  generate            request an image
  history             list recent generations
  reuse <id>          display a history entry again
  download [id]       save the displayed image, or a history entry
  help                print this list
  quit                end the session";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Prompt(String),
    Ratio(String),
    Custom,
    Width(u32),
    Height(u32),
    Style(Style),
    Seed(u64),
    Steps(u32),
    Cfg(f64),
    Sampler(Sampler),
    Show,
    Url,
    Generate,
    History,
    Reuse(String),
    Download(Option<String>),
    Help,
    Quit,
}

fn required<'a>(command: &str, arg: &'a str) -> Result<&'a str> {
    if arg.is_empty() {
        Err(StudioError::InvalidInput(format!(
            "'{}' needs an argument",
            command
        )))
    } else {
        Ok(arg)
    }
}

/// Parses one input line. The command word is case-insensitive; the prompt
/// text is kept as typed.
pub fn parse_command(line: &str) -> Result<SessionCommand> {
    let line = line.trim();
    let (word, arg) = match line.split_once(char::is_whitespace) {
        Some((word, arg)) => (word, arg.trim()),
        None => (line, ""),
    };
    let word = word.to_ascii_lowercase();

    let command = match word.as_str() {
        "prompt" => SessionCommand::Prompt(arg.to_string()),
        "ratio" => SessionCommand::Ratio(required(&word, arg)?.to_string()),
        "custom" => SessionCommand::Custom,
        "width" => SessionCommand::Width(parse_number("width", required(&word, arg)?)?),
        "height" => SessionCommand::Height(parse_number("height", required(&word, arg)?)?),
        "style" => SessionCommand::Style(required(&word, arg)?.parse()?),
        "seed" => SessionCommand::Seed(parse_number("seed", required(&word, arg)?)?),
        "steps" => SessionCommand::Steps(parse_number("steps", required(&word, arg)?)?),
        "cfg" => SessionCommand::Cfg(parse_number("cfg", required(&word, arg)?)?),
        "sampler" => SessionCommand::Sampler(required(&word, arg)?.parse()?),
        "show" => SessionCommand::Show,
        "url" => SessionCommand::Url,
        "generate" => SessionCommand::Generate,
        "history" => SessionCommand::History,
        "reuse" => SessionCommand::Reuse(required(&word, arg)?.to_string()),
        "download" => SessionCommand::Download((!arg.is_empty()).then(|| arg.to_string())),
        "help" | "?" => SessionCommand::Help,
        "quit" | "exit" => SessionCommand::Quit,
        "" => return Err(StudioError::InvalidInput("empty command".into())),
        other => {
            return Err(StudioError::InvalidInput(format!(
                "unknown command '{}', try 'help'",
                other
            )))
        }
    };
    Ok(command)
}

pub fn describe_state(state: &StudioState) -> String {
    let status = match &state.status {
        RequestStatus::Idle => "idle".to_string(),
        RequestStatus::Requesting { url, .. } => format!("requesting {}", url),
        RequestStatus::Displayed { record_id, url } => format!("showing {} {}", record_id, url),
        RequestStatus::Failed { message } => format!("failed: {}", message),
    };
    format!(
        "prompt:  {}\nstyle:   {} ({})\nsize:    {}\nseed:    {}  steps: {}  cfg: {}  sampler: {}\nstatus:  {}",
        state.prompt,
        state.style,
        state.style.display_name(),
        state.size,
        state.params.seed,
        state.params.steps,
        state.params.cfg_scale,
        state.params.sampler,
        status
    )
}

/// Runs one command against the studio. Returns the reply text, or `None`
/// when the session should end.
pub async fn execute(studio: &Studio, command: SessionCommand) -> Result<Option<String>> {
    let reply = match command {
        SessionCommand::Prompt(text) => {
            studio.set_prompt(text);
            "ok".to_string()
        }
        SessionCommand::Ratio(selection) => studio.select_size(&selection).size.to_string(),
        SessionCommand::Custom => studio.select_size("custom").size.to_string(),
        SessionCommand::Width(width) => studio.set_width(width).size.to_string(),
        SessionCommand::Height(height) => studio.set_height(height).size.to_string(),
        SessionCommand::Style(style) => studio.set_style(style).style.to_string(),
        SessionCommand::Seed(seed) => studio.set_seed(seed).params.seed.to_string(),
        SessionCommand::Steps(steps) => studio.set_steps(steps).params.steps.to_string(),
        SessionCommand::Cfg(cfg_scale) => studio.set_cfg_scale(cfg_scale)?.params.cfg_scale.to_string(),
        SessionCommand::Sampler(sampler) => studio.set_sampler(sampler).params.sampler.to_string(),
        SessionCommand::Show => describe_state(&studio.state()),
        SessionCommand::Url => studio.request_url()?.to_string(),
        SessionCommand::Generate => {
            let record = studio.generate().await?;
            format!("generated {} {}", record.id, record.url)
        }
        SessionCommand::History => {
            let history = studio.history();
            if history.is_empty() {
                "no generations yet".to_string()
            } else {
                history
                    .iter()
                    .map(|record| {
                        let created = record
                            .created_at()
                            .map(|at| at.format("%H:%M:%S").to_string())
                            .unwrap_or_default();
                        format!(
                            "{}  {}  {}  seed={}  {}",
                            record.id, created, record.size, record.params.seed, record.prompt
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        SessionCommand::Reuse(id) => {
            let record = studio.reuse(&id)?;
            format!("showing {} {}", record.id, record.url)
        }
        SessionCommand::Download(id) => {
            let saved = match id {
                Some(id) => studio.download_record(&id).await?,
                None => studio.download_current().await?,
            };
            format!("saved {} ({} bytes)", saved.filename, saved.bytes_written)
        }
        SessionCommand::Help => {
            let presets: Vec<&str> = PRESET_SIZES.iter().map(|preset| preset.label).collect();
            format!("{}\nratios: {}", HELP, presets.join(", "))
        }
        SessionCommand::Quit => return Ok(None),
    };
    Ok(Some(reply))
}

/// Reads commands until `quit` or end of input. Command errors are reported
/// on the writer and the session keeps going; only I/O errors end it early.
pub async fn run_session<R, W>(studio: &Studio, reader: R, writer: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let outcome = match parse_command(&line) {
            Ok(command) => execute(studio, command).await,
            Err(e) => Err(e),
        };

        let reply = match outcome {
            Ok(Some(reply)) => reply,
            Ok(None) => break,
            Err(e) => {
                log::debug!("Command '{}' failed: {}", line.trim(), e);
                format!("error: {}", e)
            }
        };

        writer.write_all(reply.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    log::info!("👋 Session ended");
    Ok(())
}
