// pollgen - command line front end for the image request builder

use clap::{Args, Parser, Subcommand, ValueEnum};
use pollgen::{
    logger::{self, LoggerConfig},
    models::CUSTOM_LABEL,
    session, Sampler, Studio, StudioConfig, Style, PRESET_SIZES,
};
use std::path::PathBuf;
use tokio::io::BufReader;

#[derive(Parser, Debug)]
#[command(author, version, about = "Build and send Pollinations-style image requests", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Debug logging with module and file locations
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Also append log lines to this file
    #[arg(long, global = true)]
    log_file: Option<String>,

    /// Directory downloaded images are written to
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Request one or more images
    Generate {
        #[command(flatten)]
        request: RequestArgs,

        /// Number of images; the seed advances by one after each
        #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        count: u32,

        /// Save each image to the output directory
        #[arg(short, long)]
        download: bool,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the request URL without sending it
    Url {
        #[command(flatten)]
        request: RequestArgs,
    },
    /// List preset sizes, styles and samplers
    Presets,
    /// Interactive session reading commands from stdin
    Session {
        #[command(flatten)]
        request: RequestArgs,
    },
}

#[derive(Args, Debug)]
struct RequestArgs {
    /// Text prompt describing the image
    #[arg(short, long)]
    prompt: Option<String>,

    /// Preset aspect ratio (1:1, 3:2, 2:3, 16:9, 9:16) or "custom"
    #[arg(short, long)]
    ratio: Option<String>,

    /// Image width; the height follows when a ratio is locked
    #[arg(short, long)]
    width: Option<u32>,

    /// Image height; the width follows when a ratio is locked
    #[arg(long)]
    height: Option<u32>,

    /// Visual style appended to the prompt
    #[arg(short, long, value_enum)]
    style: Option<StyleArg>,

    #[arg(long)]
    seed: Option<u64>,

    /// Sampling steps (1-150)
    #[arg(long)]
    steps: Option<u32>,

    /// Guidance scale (1.0-20.0)
    #[arg(long)]
    cfg_scale: Option<f64>,

    #[arg(long, value_enum)]
    sampler: Option<SamplerArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StyleArg {
    /// Photographic look
    Realistic,
    /// Anime illustration
    Anime,
    /// Oil painting, heavy strokes
    Oil,
    /// Light watercolor
    Watercolor,
}

impl From<StyleArg> for Style {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Realistic => Style::Realistic,
            StyleArg::Anime => Style::Anime,
            StyleArg::Oil => Style::Oil,
            StyleArg::Watercolor => Style::Watercolor,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SamplerArg {
    #[value(name = "euler_a")]
    EulerA,
    Euler,
    Lms,
    Heun,
    Dpm2,
    #[value(name = "dpm2_a")]
    Dpm2A,
}

impl From<SamplerArg> for Sampler {
    fn from(arg: SamplerArg) -> Self {
        match arg {
            SamplerArg::EulerA => Sampler::EulerAncestral,
            SamplerArg::Euler => Sampler::Euler,
            SamplerArg::Lms => Sampler::Lms,
            SamplerArg::Heun => Sampler::Heun,
            SamplerArg::Dpm2 => Sampler::Dpm2,
            SamplerArg::Dpm2A => Sampler::Dpm2Ancestral,
        }
    }
}

impl RequestArgs {
    /// Applies the flags on top of the studio defaults. The ratio is applied
    /// before width and height; without a ratio, a width or height switches
    /// to custom size.
    fn apply(&self, studio: &Studio) -> pollgen::Result<()> {
        if let Some(prompt) = &self.prompt {
            studio.set_prompt(prompt.clone());
        }
        if let Some(style) = self.style {
            studio.set_style(style.into());
        }

        match &self.ratio {
            Some(ratio) => {
                studio.select_size(ratio);
            }
            None if self.width.is_some() || self.height.is_some() => {
                studio.select_size(CUSTOM_LABEL);
            }
            None => {}
        }
        if let Some(width) = self.width {
            studio.set_width(width);
        }
        if let Some(height) = self.height {
            studio.set_height(height);
        }

        if let Some(seed) = self.seed {
            studio.set_seed(seed);
        }
        if let Some(steps) = self.steps {
            studio.set_steps(steps);
        }
        if let Some(cfg_scale) = self.cfg_scale {
            studio.set_cfg_scale(cfg_scale)?;
        }
        if let Some(sampler) = self.sampler {
            studio.set_sampler(sampler.into());
        }
        Ok(())
    }
}

fn print_presets() {
    println!("Sizes:");
    for preset in PRESET_SIZES.iter() {
        println!("  {:<6} {}x{}", preset.label, preset.width, preset.height);
    }
    println!("  {:<6} any size from 64 to 2048", CUSTOM_LABEL);

    println!("Styles:");
    for style in Style::ALL {
        println!("  {:<11} {}", style.key(), style.suffix());
    }

    println!("Samplers:");
    for sampler in Sampler::ALL {
        println!("  {:<8} {}", sampler.as_str(), sampler.display_name());
    }
}

async fn run_generate(
    studio: &Studio,
    count: u32,
    download: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    for _ in 0..count {
        let record = studio.generate().await?;
        let saved = if download {
            Some(studio.download_record(&record.id).await?)
        } else {
            None
        };

        if json {
            let line = serde_json::json!({ "record": record, "saved": saved });
            println!("{}", serde_json::to_string(&line)?);
        } else {
            println!(
                "{}  {}  seed={}  {}",
                record.id, record.size, record.params.seed, record.url
            );
            if let Some(saved) = saved {
                println!("  saved {}", saved.location);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    let mut config = StudioConfig::from_env();
    if let Some(dir) = &cli.output_dir {
        config = config.with_output_dir(dir.clone());
    }

    let mut logger_config = if cli.log_json {
        LoggerConfig::production()
    } else if cli.verbose {
        LoggerConfig::development()
    } else {
        LoggerConfig::default().with_level(config.log_level)
    };
    if cli.verbose {
        logger_config = logger_config.with_level(logger::LogLevel::Debug);
    }
    if let Some(path) = &cli.log_file {
        logger_config = logger_config.with_file_output(path);
    }
    logger::init_with_config(logger_config)?;

    if env_loaded {
        log::debug!("✅ .env file loaded");
    }
    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    logger::log_config_info(&config);

    let studio = Studio::new(config)?;

    match cli.command {
        Command::Generate {
            request,
            count,
            download,
            json,
        } => {
            request.apply(&studio)?;
            run_generate(&studio, count, download, json).await?;
        }
        Command::Url { request } => {
            request.apply(&studio)?;
            println!("{}", studio.request_url()?);
        }
        Command::Presets => print_presets(),
        Command::Session { request } => {
            request.apply(&studio)?;
            let stdin = BufReader::new(tokio::io::stdin());
            let mut stdout = tokio::io::stdout();
            session::run_session(&studio, stdin, &mut stdout).await?;
        }
    }

    Ok(())
}
