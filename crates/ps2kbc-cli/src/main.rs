#![forbid(unsafe_code)]

// Native-only tool. Keep a stub `main` so `--workspace` builds for wasm targets still succeed.
#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::io::{self, BufWriter, Write};
    use std::path::PathBuf;

    use anyhow::{Context, Result};
    use clap::Parser;
    use ps2kbc_cli::{parse_script, Replay};
    use ps2kbc_devices_input::I8042Config;
    use tracing_subscriber::EnvFilter;

    #[derive(Debug, Parser)]
    #[command(about = "Replays a port-access script against the i8042 keyboard controller model")]
    pub struct Args {
        /// JSON array of `write`, `read`, `inject_keyboard` and `inject_mouse` steps.
        #[arg(long)]
        script: PathBuf,

        /// Controller configuration (ports and access latency) as JSON.
        #[arg(long)]
        config: Option<PathBuf>,
    }

    pub fn main() -> Result<()> {
        // Logs go to stderr so stdout stays a clean read trace.
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .init();

        let args = Args::parse();

        let config = match &args.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config: {}", path.display()))?;
                I8042Config::from_json_str(&text)
                    .with_context(|| format!("invalid config: {}", path.display()))?
            }
            None => I8042Config::default(),
        };

        let text = std::fs::read_to_string(&args.script)
            .with_context(|| format!("failed to read script: {}", args.script.display()))?;
        let ops = parse_script(&text)?;
        tracing::debug!(steps = ops.len(), ?config, "starting replay");

        let mut replay = Replay::new(config)?;
        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        let result = replay.run(&ops, &mut out);
        // Keep the partial trace when a step fails.
        out.flush()?;
        let summary = result?;

        writeln!(out, "irq1 pulses: {}", summary.keyboard_irqs)?;
        writeln!(out, "irq12 pulses: {}", summary.mouse_irqs)?;
        writeln!(out, "ticks: {}", summary.ticks)?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::main()
}
