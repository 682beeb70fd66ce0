use trellis::error::Result;

use crate::build::Site;
use crate::config::Config;

mod build;
mod config;
mod minify;
mod serve;
mod watch;

pub const CONFIG_FILE: &str = "espalier.toml";
pub const ENV_VAR: &str = "ESPALIER_ENV";

mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        /// Builds a static site from data files, templated pages and Markdown.
        cmd espalier {
            /// Run as if started in `dir`.
            optional -C, --dir dir: PathBuf
            /// Log debug messages.
            optional -v, --verbose

            /// Clean the output directory, copy public files and render pages.
            cmd build {}
            /// Build, then rebuild whenever a source file changes.
            cmd watch {}
            /// Build, then serve the output and rebuild on changes.
            cmd serve {
                /// Port to listen on, instead of the configured one.
                optional -p, --port port: u16
            }
            /// Remove the output directory.
            cmd clean {}
        }
    }
}

fn init_logging(verbose: bool) {
    let env = env_logger::Env::default().default_filter_or("info");
    let mut builder = env_logger::Builder::from_env(env);
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }

    builder.format_timestamp(None).init();
}

fn run(flags: flags::Espalier) -> Result<()> {
    let root = match flags.dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let site = Site::new(Config::discover(&root)?);
    match flags.subcommand {
        flags::EspalierCmd::Build(_) => site.build().map(|_| ()),
        flags::EspalierCmd::Clean(_) => site.clean(),
        flags::EspalierCmd::Watch(_) => {
            site.build()?;
            watch::watch(&site)
        }
        flags::EspalierCmd::Serve(serve) => {
            let port = serve.port.unwrap_or(site.config.settings.port);
            site.build()?;
            serve::serve(site, port)
        }
    }
}

pub fn main() {
    let flags = flags::Espalier::from_env_or_exit();
    init_logging(flags.verbose);

    if let Err(e) = run(flags) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
