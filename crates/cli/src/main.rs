use anyhow::{Context, Result, bail};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt};
use whisperer::{Action, Arity, ParseOutcome, Whisperer};

const MAX_PONIES: i64 = 5;

fn main() -> Result<ExitCode> {
    init_tracing();

    let mut app = build_app()?;
    match app
        .parse_argv(std::env::args())
        .context("failed to parse command line")?
    {
        ParseOutcome::Help => {
            print!("{}", app.help_text());
            Ok(ExitCode::SUCCESS)
        }
        ParseOutcome::Version => {
            print!("{}", app.version_text());
            Ok(ExitCode::SUCCESS)
        }
        ParseOutcome::Ok => {
            let code = app.run();
            Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
        }
    }
}

fn build_app() -> Result<Whisperer> {
    let mut app = Whisperer::new();
    app.set_app_name("ponies");
    app.set_help_banner("Usage: ponies [global options] <action> [options]");
    app.set_version(format!("ponies version - {}", env!("CARGO_PKG_VERSION")));
    app.set_delimiters(["+", ";", "_then"]);

    app.define_global_flag_with("ponies", "all the ponies", 1i64, |count: &i64| {
        if *count > MAX_PONIES {
            bail!("You have assigned too many ponies!");
        }
        if *count < 0 {
            bail!("The herd cannot hold a negative number of ponies.");
        }
        Ok(())
    });

    app.define_action(
        Action::new("gallop", Arity::Exactly(0))
            .chainable(true)
            .description("make the ponies gallop")
            .help("The horses, they be a galloping")
            .callback(gallop),
    );
    app.define_action(
        Action::new("trot", Arity::AtLeast(2))
            .chainable(true)
            .description("make the ponies trot in some way")
            .help("Usage: ponies trot <mode> <mode>...")
            .callback(trot),
    );
    app.define_action(
        Action::new("feed", Arity::AtLeast(0))
            .chainable(true)
            .description("feed the ponies")
            .callback(feed),
    );

    app.define_action_flag("gallop", "t tired", "are the horses tired?", false)?;
    app.define_action_flag_with("feed", "a apples", "apples per pony", 1i64, |n: &i64| {
        if *n < 0 {
            bail!("ponies cannot give apples back");
        }
        Ok(())
    })?;

    Ok(app)
}

fn ponies(app: &Whisperer) -> i64 {
    app.get_flag::<i64>("ponies").unwrap_or(1)
}

fn gallop(app: &mut Whisperer, _args: &[String]) -> i32 {
    if app.get_flag::<bool>("tired").unwrap_or(false) {
        println!("The pony is too tired to gallop.");
        return 1;
    }
    for _ in 0..ponies(app) {
        println!("Galloping into the night!");
    }
    0
}

fn trot(app: &mut Whisperer, args: &[String]) -> i32 {
    for mode in args {
        tracing::debug!(mode = %mode, ponies = ponies(app), "trotting");
        println!("Trotting like a {mode}");
    }
    0
}

fn feed(app: &mut Whisperer, args: &[String]) -> i32 {
    let apples = app.get_flag::<i64>("apples").unwrap_or(1);
    let total = apples.saturating_mul(ponies(app));
    if args.is_empty() {
        println!("Fed {total} apple(s) to the herd.");
    } else {
        for name in args {
            println!("Fed {apples} apple(s) to {name}.");
        }
    }
    0
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
