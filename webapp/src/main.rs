use anyhow::Context;
use clap::Parser;
use medviscore::narrative::Language;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use web::bridge::WebBridge;
use web::session::SessionContext;
use workflow::config::AppConfig;
use workflow::runner::Runner;

mod web;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Rust-facing medical vision workflow driver")]
struct Args {
    /// Run a single offline analysis of the given image and print the report
    #[arg(long)]
    analyze: Option<PathBuf>,
    /// Load an app config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Narrative language code (en, hi, ta)
    #[arg(long)]
    language: Option<String>,
    /// Bind port for the web front-end
    #[arg(long)]
    port: Option<u16>,
    /// Keep the web front-end alive for incoming analyses
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut app_config = if let Some(path) = args.config {
        AppConfig::load(path)?
    } else {
        let api_key = std::env::var("GEMINI_API_KEY")
            .context("set GEMINI_API_KEY or pass --config with an api_key entry")?;
        AppConfig::from_args(api_key, 8080)
    };
    if let Some(port) = args.port {
        app_config.port = port;
    }

    let language = match args.language {
        Some(code) => code
            .parse::<Language>()
            .map_err(|message| anyhow::anyhow!(message))?,
        None => app_config.default_language(),
    };

    let runner = Runner::new(app_config.clone());
    let session = Arc::new(SessionContext::new(runner.metrics()));
    let bridge = WebBridge::new(Arc::new(runner.clone()), session.clone(), app_config.port);

    if let Some(image_path) = args.analyze {
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for offline analysis")?;
        let result = runtime.block_on(runner.execute(&image_path, language))?;

        println!(
            "Offline run -> anomaly {}, confidence {:.1}%, regions {}",
            if result.detection.has_anomaly { "yes" } else { "no" },
            result.detection.confidence * 100.0,
            result.detection.regions.len()
        );
        println!("{}", result.report);

        let report_dir = PathBuf::from("reports");
        fs::create_dir_all(&report_dir)?;
        let report_path = report_dir.join(format!(
            "report_{}.txt",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        ));
        fs::write(&report_path, &result.report)?;
        bridge.publish_status(&format!("Report saved to {}", report_path.display()));
    }

    if args.serve {
        bridge.publish_status(&format!(
            "Web front-end running on http://127.0.0.1:{} (Ctrl+C to stop)...",
            app_config.port
        ));
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
