//! Subcommand handlers and terminal rendering.

use clap::Args;
use mvcmovie_core::controller::hello_world;
use mvcmovie_core::{
    ActionResult, ModelState, Movie, MovieForm, MovieFormPatch, MovieFormView, MovieRepository,
    MoviesController,
};
use serde::Serialize;
use std::error::Error;
use std::process::ExitCode;

type CommandResult = Result<ExitCode, Box<dyn Error>>;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Exact genre to keep
    #[arg(long)]
    pub genre: Option<String>,

    /// Text the title must contain (case-insensitive)
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Debug, Args)]
pub struct MovieArgs {
    #[arg(long)]
    pub title: String,

    /// Release date as YYYY-MM-DD
    #[arg(long)]
    pub release_date: String,

    #[arg(long)]
    pub genre: String,

    #[arg(long)]
    pub price: String,

    #[arg(long)]
    pub rating: String,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    pub id: Option<i64>,

    /// Version token shown when you last viewed the movie
    #[arg(long)]
    pub version: String,

    #[arg(long)]
    pub title: Option<String>,

    /// Release date as YYYY-MM-DD
    #[arg(long)]
    pub release_date: Option<String>,

    #[arg(long)]
    pub genre: Option<String>,

    #[arg(long)]
    pub price: Option<String>,

    #[arg(long)]
    pub rating: Option<String>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub id: Option<i64>,

    /// Actually remove the movie
    #[arg(long)]
    pub confirm: bool,
}

pub fn list<R: MovieRepository>(
    controller: &MoviesController<R>,
    args: &ListArgs,
    json: bool,
) -> CommandResult {
    let result = controller.index(args.genre.as_deref(), args.search.as_deref())?;
    let view = match result {
        ActionResult::View(view) => view,
        other => return Ok(report_non_view(&other)),
    };

    if json {
        print_json(&view)?;
    } else {
        print_movie_table(&view.movies);
        println!();
        println!("Genres: {}", view.genres.join(", "));
    }
    Ok(ExitCode::SUCCESS)
}

pub fn genres<R: MovieRepository>(controller: &MoviesController<R>, json: bool) -> CommandResult {
    let result = controller.index(None, None)?;
    let view = match result {
        ActionResult::View(view) => view,
        other => return Ok(report_non_view(&other)),
    };

    if json {
        print_json(&view.genres)?;
    } else {
        for genre in &view.genres {
            println!("{genre}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub fn show<R: MovieRepository>(
    controller: &MoviesController<R>,
    id: Option<i64>,
    json: bool,
) -> CommandResult {
    let result = controller.details(id)?;
    let movie = match result {
        ActionResult::View(movie) => movie,
        other => return Ok(report_non_view(&other)),
    };

    if json {
        print_json(&movie)?;
    } else {
        print_movie(&movie);
    }
    Ok(ExitCode::SUCCESS)
}

pub fn create<R: MovieRepository>(
    controller: &MoviesController<R>,
    args: MovieArgs,
    json: bool,
) -> CommandResult {
    let form = MovieForm {
        title: args.title,
        release_date: args.release_date,
        genre: args.genre,
        price: args.price,
        rating: args.rating,
    };

    let result = controller.create(Some(controller.request_token()), form)?;
    match result {
        ActionResult::RedirectToIndex => {
            println!("Movie created.");
            Ok(ExitCode::SUCCESS)
        }
        ActionResult::View(view) => report_form_errors(&view, json),
        other => Ok(report_non_view(&other)),
    }
}

pub fn edit<R: MovieRepository>(
    controller: &MoviesController<R>,
    args: EditArgs,
    json: bool,
) -> CommandResult {
    let patch = MovieFormPatch {
        title: args.title,
        release_date: args.release_date,
        genre: args.genre,
        price: args.price,
        rating: args.rating,
    };

    let result = controller.edit_patch(
        Some(controller.request_token()),
        args.id,
        &args.version,
        &patch,
    )?;
    match result {
        ActionResult::RedirectToIndex => {
            let saved = controller.details(args.id)?;
            match saved {
                ActionResult::View(movie) if json => print_json(&movie)?,
                ActionResult::View(movie) => {
                    println!("Movie saved.");
                    print_movie(&movie);
                }
                _ => println!("Movie saved."),
            }
            Ok(ExitCode::SUCCESS)
        }
        ActionResult::View(view) => report_form_errors(&view, json),
        other => Ok(report_non_view(&other)),
    }
}

pub fn delete<R: MovieRepository>(
    controller: &MoviesController<R>,
    args: &DeleteArgs,
    json: bool,
) -> CommandResult {
    let result = controller.delete_form(args.id)?;
    let movie = match result {
        ActionResult::View(movie) => movie,
        other => return Ok(report_non_view(&other)),
    };

    if !args.confirm {
        if json {
            print_json(&movie)?;
        } else {
            println!("Are you sure you want to delete this?");
            print_movie(&movie);
            println!("Re-run with --confirm to delete movie {}.", movie.id);
        }
        return Ok(ExitCode::SUCCESS);
    }

    match controller.delete_confirmed(Some(controller.request_token()), movie.id)? {
        ActionResult::RedirectToIndex => {
            println!("Movie {} deleted.", movie.id);
            Ok(ExitCode::SUCCESS)
        }
        other => Ok(report_non_view(&other)),
    }
}

pub fn render_welcome(name: &str, times: Option<u32>, json: bool) -> Result<(), Box<dyn Error>> {
    let view = hello_world::welcome(name, times);
    if json {
        print_json(&view)?;
    } else {
        for _ in 0..view.num_times {
            println!("{}", view.message);
        }
    }
    Ok(())
}

fn report_form_errors(view: &MovieFormView, json: bool) -> CommandResult {
    if json {
        print_json(view)?;
    } else {
        print_model_state(&view.model_state);
        if let Some(version) = &view.row_version {
            eprintln!("Current version: {version}");
        }
    }
    Ok(ExitCode::FAILURE)
}

fn report_non_view<V>(result: &ActionResult<V>) -> ExitCode {
    match result {
        ActionResult::NotFound => eprintln!("Not found."),
        ActionResult::BadRequest(message) => eprintln!("Bad request: {message}"),
        ActionResult::RedirectToIndex | ActionResult::View(_) => return ExitCode::SUCCESS,
    }
    ExitCode::FAILURE
}

fn print_model_state(state: &ModelState) {
    for (key, messages) in state.iter() {
        for message in messages {
            if key.is_empty() {
                eprintln!("{message}");
            } else {
                eprintln!("{key}: {message}");
            }
        }
    }
}

fn print_movie_table(movies: &[Movie]) {
    println!(
        "{:>4}  {:<30}  {:<12}  {:<16}  {:>8}  {:<6}  {:>7}",
        "ID", "Title", "Release Date", "Genre", "Price", "Rating", "Version"
    );
    for movie in movies {
        println!(
            "{:>4}  {:<30}  {:<12}  {:<16}  {:>8.2}  {:<6}  {:>7}",
            movie.id,
            movie.title,
            movie.release_date.format("%Y-%m-%d").to_string(),
            movie.genre,
            movie.price,
            movie.rating,
            movie.version.to_string()
        );
    }
}

fn print_movie(movie: &Movie) {
    println!("ID:           {}", movie.id);
    println!("Title:        {}", movie.title);
    println!("Release Date: {}", movie.release_date.format("%Y-%m-%d"));
    println!("Genre:        {}", movie.genre);
    println!("Price:        {:.2}", movie.price);
    println!("Rating:       {}", movie.rating);
    println!("Version:      {}", movie.version);
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
