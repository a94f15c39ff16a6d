use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use mvvmkit::config::Config;
use mvvmkit::logging::init_tracing;
use mvvmkit::sample::{self, ConsoleSurface, LoginViewModel, SignedIn, SignedOut};
use mvvmkit::services::CoreServices;
use mvvmkit::view::ViewModel;

/// mvvmkit-sample - scripted walk through the login and profile screens
#[derive(Parser, Debug)]
#[command(name = "mvvmkit-sample")]
#[command(version, about, long_about = None)]
struct Args {
    /// Username typed into the login form
    #[arg(long, value_name = "NAME", default_value = "")]
    username: String,

    /// Password typed into the login form
    #[arg(long, value_name = "PASSWORD", default_value = "")]
    password: String,

    /// Navigate back to the login form after signing in
    #[arg(long)]
    back: bool,

    /// Config file (defaults to the user config directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load config")?;
    init_tracing(&config.logging);

    let surface = ConsoleSurface::stdout();
    let finder = sample::build_finder(&surface)?;
    let services = CoreServices::start(&config, finder)?;

    let greeter = surface.clone();
    services
        .events()
        .register(move |event: &SignedIn| greeter.line(&format!("Welcome, {}!", event.username)));
    let farewell = surface.clone();
    services
        .events()
        .register(move |event: &SignedOut| farewell.line(&format!("Goodbye, {}.", event.username)));

    let result = navigate(&services, &args);
    services.shutdown();
    result
}

fn navigate(services: &CoreServices, args: &Args) -> Result<()> {
    let login = Arc::new(LoginViewModel::new(
        services.views().clone(),
        services.events().clone(),
    ));
    services.views().show(Arc::clone(&login))?;
    login.set_username(args.username.as_str());
    login.set_password(args.password.as_str());

    let Some(profile) = login.submit()? else {
        login.close_window()?;
        bail!("Username and password are required");
    };

    let last: Arc<dyn ViewModel> = if args.back {
        profile.navigate_back()?
    } else {
        profile
    };
    services.views().close(last.as_ref())?;
    Ok(())
}
