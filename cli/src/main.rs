
use std::path::PathBuf;
use std::sync::Arc;

use cinema_client::config::{ClientConfig, ConfigError, normalize_base_url};
use cinema_client::net::api::ApiClient;
use cinema_client::net::error::ApiError;
use cinema_client::net::types::{
    AnalyticsQuery, BookingQuery, CinemaQuery, Credentials, MovieQuery, NewBooking, ProfileUpdate, Registration,
    SeatRequest, ShowtimeQuery, TopUp, User,
};
use cinema_client::router::{HOME_PATH, LOGIN_PATH, Navigation, Router};
use cinema_client::state::auth::AuthStore;
use cinema_client::state::session::SessionContext;
use cinema_client::util::format::{format_currency, format_date, format_duration, format_time};
use cinema_client::util::storage::FileStorage;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("{0}")]
    Auth(String),
    #[error("not signed in; run `cinema login` first")]
    SignInRequired,
    #[error("already signed in; run `cinema logout` first")]
    AlreadySignedIn,
    #[error("invalid seat `{0}`; expected ROW:NUMBER, e.g. A:5")]
    InvalidSeat(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "cinema", about = "Cinema booking API client")]
struct Cli {
    #[arg(long, env = "CINEMA_API_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "CINEMA_STATE_FILE", help = "File holding the persisted session")]
    state_file: Option<PathBuf>,

    #[arg(long, default_value_t = false, help = "Print raw JSON instead of text")]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Health,
    Login {
        email: String,
        #[arg(long, env = "CINEMA_PASSWORD")]
        password: String,
    },
    Register {
        email: String,
        #[arg(long, env = "CINEMA_PASSWORD")]
        password: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        phone: Option<String>,
    },
    Logout,
    Profile(ProfileCommand),
    Movies(MoviesCommand),
    Cinemas {
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        page: Option<u32>,
    },
    Showtimes {
        #[arg(long)]
        movie_id: Option<String>,
        #[arg(long)]
        cinema_id: Option<String>,
        #[arg(long, help = "YYYY-MM-DD")]
        date: Option<String>,
    },
    Bookings(BookingsCommand),
    Topup {
        amount: f64,
    },
    Popular {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        days: Option<u32>,
    },
    /// Resolve an app location through the route guard.
    Navigate {
        location: String,
    },
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: Option<ProfileSubcommand>,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Show,
    Update {
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
}

#[derive(Args, Debug)]
struct MoviesCommand {
    #[command(subcommand)]
    command: MoviesSubcommand,
}

#[derive(Subcommand, Debug)]
enum MoviesSubcommand {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    Show {
        id: String,
    },
}

#[derive(Args, Debug)]
struct BookingsCommand {
    #[command(subcommand)]
    command: BookingsSubcommand,
}

#[derive(Subcommand, Debug)]
enum BookingsSubcommand {
    List {
        #[arg(long)]
        status: Option<String>,
    },
    Create {
        showtime_id: String,
        #[arg(long = "seat", required = true, help = "ROW:NUMBER, repeatable")]
        seats: Vec<String>,
        #[arg(long, default_value = "wallet")]
        payment_method: String,
    },
    Confirm {
        id: String,
    },
    Cancel {
        id: String,
    },
}

struct CliContext {
    auth: AuthStore,
    api: ApiClient,
    router: Router,
    json: bool,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let location = location_for(&cli.command);
    if let Err(e) = run(cli, &location).await {
        eprintln!("error: {e}");
        if let CliError::Api(api) = &e {
            if let Some(to) = api.redirect(&location) {
                eprintln!("redirect: {to}");
            }
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, location: &str) -> Result<(), CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config.base_url = normalize_base_url(base_url)?;
    }
    if let Some(state_file) = cli.state_file {
        config.state_file = state_file;
    }
    tracing::debug!(base_url = %config.base_url, state_file = %config.state_file.display(), "cli config");

    let session = SessionContext::load(Arc::new(FileStorage::new(config.state_file.clone())));
    let api = ApiClient::new(&config, session.clone())?;
    let ctx = CliContext { auth: AuthStore::new(api.clone()), api, router: Router::new(session), json: cli.json };

    // Commands backed by a guarded view go through the router first.
    follow_guard(ctx.router.navigate(location))?;

    match cli.command {
        Command::Health => {
            let health = ctx.api.health().await?;
            println!("{}: {}", health.status, health.message);
            Ok(())
        }
        Command::Login { email, password } => {
            ctx.auth.login(&Credentials { email, password }).await.map_err(CliError::Auth)?;
            print_signed_in(&ctx);
            Ok(())
        }
        Command::Register { email, password, full_name, phone } => {
            let registration = Registration { email, password, full_name, phone };
            ctx.auth.register(&registration).await.map_err(CliError::Auth)?;
            print_signed_in(&ctx);
            Ok(())
        }
        Command::Logout => {
            ctx.auth.logout();
            println!("signed out");
            Ok(())
        }
        Command::Profile(profile) => run_profile(&ctx, profile).await,
        Command::Movies(movies) => run_movies(&ctx, movies).await,
        Command::Cinemas { city, page } => {
            let query = CinemaQuery { city, page, ..CinemaQuery::default() };
            let page = ctx.api.get_cinemas(&query).await?;
            if ctx.json {
                return print_json(&serde_json::to_value(&page.items)?);
            }
            for cinema in &page.items {
                println!("{}  {} ({}, {})", cinema.id, cinema.name, cinema.city, cinema.address);
            }
            Ok(())
        }
        Command::Showtimes { movie_id, cinema_id, date } => {
            let query = ShowtimeQuery { movie_id, cinema_id, date, ..ShowtimeQuery::default() };
            let page = ctx.api.get_showtimes(&query).await?;
            if ctx.json {
                return print_json(&serde_json::to_value(&page.items)?);
            }
            for showtime in &page.items {
                let starts = format_date(&showtime.start_time).unwrap_or_else(|_| showtime.start_time.clone());
                println!(
                    "{}  {}  {} {}  {} seats free",
                    showtime.id,
                    starts,
                    showtime.format,
                    format_currency(showtime.base_price),
                    showtime.available_seats
                );
            }
            Ok(())
        }
        Command::Bookings(bookings) => run_bookings(&ctx, bookings).await,
        Command::Topup { amount } => {
            let result = ctx.api.top_up_wallet(&TopUp { amount }).await?;
            if ctx.json {
                return print_json(&serde_json::to_value(&result)?);
            }
            println!(
                "topped up {}; balance {}",
                format_currency(result.amount),
                format_currency(result.wallet.balance)
            );
            Ok(())
        }
        Command::Popular { limit, days } => {
            let popular = ctx.api.get_popular_movies(&AnalyticsQuery { limit, days }).await?;
            if ctx.json {
                return print_json(&serde_json::to_value(&popular)?);
            }
            println!("{} ({} movies)", popular.period, popular.total_movies);
            for movie in &popular.movies {
                println!(
                    "{}  {}  {} bookings  {}",
                    movie.id,
                    movie.title,
                    movie.total_bookings,
                    format_currency(movie.total_revenue)
                );
            }
            Ok(())
        }
        Command::Navigate { location } => {
            match ctx.router.navigate(&location) {
                Navigation::Proceed(target) => {
                    println!("proceed {:?} {:?}", target.name(), target.params);
                }
                Navigation::Redirect(to) => println!("redirect {to}"),
            }
            Ok(())
        }
    }
}

async fn run_profile(ctx: &CliContext, profile: ProfileCommand) -> Result<(), CliError> {
    match profile.command.unwrap_or(ProfileSubcommand::Show) {
        ProfileSubcommand::Show => {
            ctx.auth.fetch_profile().await;
            let user = ctx.auth.user().ok_or(CliError::SignInRequired)?;
            print_user(ctx, &user)
        }
        ProfileSubcommand::Update { full_name, phone } => {
            let user = ctx.api.update_profile(&ProfileUpdate { full_name, phone }).await?;
            if let Err(e) = ctx.api.session().replace_user(user.clone()) {
                tracing::warn!(error = %e, "failed to persist updated profile");
            }
            print_user(ctx, &user)
        }
    }
}

async fn run_movies(ctx: &CliContext, movies: MoviesCommand) -> Result<(), CliError> {
    match movies.command {
        MoviesSubcommand::List { search, genre, page, limit } => {
            let query = MovieQuery { search, genre, page, limit, ..MovieQuery::default() };
            let page = ctx.api.get_movies(&query).await?;
            if ctx.json {
                return print_json(&serde_json::to_value(&page.items)?);
            }
            for movie in &page.items {
                println!(
                    "{}  {}  {}  IMDb {:.1}",
                    movie.id,
                    movie.title,
                    format_duration(movie.duration),
                    movie.imdb_rating
                );
            }
            if let Some(p) = page.pagination {
                println!("page {}/{} ({} total)", p.page, p.total_pages, p.total);
            }
            Ok(())
        }
        MoviesSubcommand::Show { id } => {
            let details = ctx.api.get_movie_details(&id).await?;
            if ctx.json {
                return print_json(&serde_json::to_value(&details)?);
            }
            let movie = &details.movie;
            println!("{} ({})", movie.title, format_duration(movie.duration));
            println!("{}", movie.genres.join(", "));
            println!("{}", movie.description);
            println!("reviews: {} avg {:.1}", details.total_reviews, details.average_review_rating);
            Ok(())
        }
    }
}

async fn run_bookings(ctx: &CliContext, bookings: BookingsCommand) -> Result<(), CliError> {
    let booking = match bookings.command {
        BookingsSubcommand::List { status } => {
            let page = ctx.api.get_my_bookings(&BookingQuery { status, ..BookingQuery::default() }).await?;
            if ctx.json {
                return print_json(&serde_json::to_value(&page.items)?);
            }
            for booking in &page.items {
                println!(
                    "{}  {}  {}  {}",
                    booking.id,
                    booking.booking_number,
                    booking.status,
                    format_currency(booking.total_amount)
                );
            }
            return Ok(());
        }
        BookingsSubcommand::Create { showtime_id, seats, payment_method } => {
            let seats = seats.iter().map(|s| parse_seat(s)).collect::<Result<Vec<_>, _>>()?;
            ctx.api.create_booking(&NewBooking { showtime_id, seats, payment_method }).await?
        }
        BookingsSubcommand::Confirm { id } => ctx.api.confirm_booking(&id).await?,
        BookingsSubcommand::Cancel { id } => {
            let result = ctx.api.cancel_booking(&id).await?;
            println!("booking {} cancelled: {}", result.booking_id, result.cancelled);
            return Ok(());
        }
    };

    if ctx.json {
        return print_json(&serde_json::to_value(&booking)?);
    }
    println!("{}  {}  {}", booking.booking_number, booking.status, format_currency(booking.total_amount));
    for seat in &booking.seats {
        println!("  {}{}  {}", seat.row, seat.number, format_currency(seat.price));
    }
    if let Some(expires) = booking.expires_at.as_deref() {
        let at = format_time(expires).unwrap_or_else(|_| expires.to_owned());
        println!("hold expires at {at}");
    }
    Ok(())
}

/// App location a command corresponds to; the guard and failure redirects
/// are evaluated against it.
fn location_for(command: &Command) -> String {
    match command {
        Command::Login { .. } | Command::Register { .. } => "/login".to_owned(),
        Command::Profile(_) | Command::Bookings(BookingsCommand { command: BookingsSubcommand::List { .. } }) => {
            "/profile".to_owned()
        }
        Command::Topup { .. } => "/topup".to_owned(),
        Command::Movies(MoviesCommand { command: MoviesSubcommand::Show { id } }) => format!("/movie/{id}"),
        Command::Bookings(BookingsCommand {
            command: BookingsSubcommand::Create { showtime_id, .. },
        }) => format!("/booking/{showtime_id}"),
        Command::Bookings(_) => "/profile".to_owned(),
        _ => "/".to_owned(),
    }
}

/// Map a guard redirect onto the CLI: `/login` needs a session, `/` means
/// the login view is closed to a signed-in user.
fn follow_guard(navigation: Navigation) -> Result<(), CliError> {
    match navigation {
        Navigation::Proceed(_) => Ok(()),
        Navigation::Redirect(to) if to == LOGIN_PATH => Err(CliError::SignInRequired),
        Navigation::Redirect(to) if to == HOME_PATH => Err(CliError::AlreadySignedIn),
        Navigation::Redirect(to) => {
            tracing::debug!(to = %to, "guard redirected");
            Ok(())
        }
    }
}

fn parse_seat(raw: &str) -> Result<SeatRequest, CliError> {
    let (row, number) = raw.split_once(':').ok_or_else(|| CliError::InvalidSeat(raw.to_owned()))?;
    let row = row.trim();
    let number = number.trim().parse::<u32>().map_err(|_| CliError::InvalidSeat(raw.to_owned()))?;
    if row.is_empty() || number == 0 {
        return Err(CliError::InvalidSeat(raw.to_owned()));
    }
    Ok(SeatRequest { row: row.to_owned(), number })
}

fn print_signed_in(ctx: &CliContext) {
    match ctx.auth.user() {
        Some(user) => println!("signed in as {} <{}>", user.full_name, user.email),
        None => println!("signed in"),
    }
}

fn print_user(ctx: &CliContext, user: &User) -> Result<(), CliError> {
    if ctx.json {
        return print_json(&serde_json::to_value(user)?);
    }
    println!("{} <{}>", user.full_name, user.email);
    if !user.phone.is_empty() {
        println!("phone: {}", user.phone);
    }
    println!("balance: {}", format_currency(user.wallet.balance));
    Ok(())
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
