use mvcmovie_core::controller::movies::{
    CONCURRENCY_CONFLICT_MESSAGE, DELETED_BY_ANOTHER_USER_MESSAGE, INVALID_VERSION_MESSAGE,
};
use mvcmovie_core::db::open_db_in_memory;
use mvcmovie_core::{
    seed_if_empty, ActionResult, AntiForgery, ModelState, MovieForm, MovieFormPatch,
    MovieListQuery, MovieRepository, MovieService, MoviesController, SqliteMovieRepository,
};
use rusqlite::Connection;

const TOKEN: &str = "session-token";

fn seeded() -> Connection {
    let conn = open_db_in_memory().unwrap();
    seed_if_empty(&conn).unwrap();
    conn
}

fn controller(conn: &Connection) -> MoviesController<SqliteMovieRepository<'_>> {
    let repo = SqliteMovieRepository::try_new(conn).unwrap();
    MoviesController::new(MovieService::new(repo), AntiForgery::with_token(TOKEN))
}

fn rio_bravo_id(conn: &Connection) -> i64 {
    let repo = SqliteMovieRepository::try_new(conn).unwrap();
    repo.list_movies(&MovieListQuery {
        genre: Some("Western".to_string()),
        title_contains: None,
    })
    .unwrap()[0]
        .id
}

fn form(title: &str) -> MovieForm {
    MovieForm {
        title: title.to_string(),
        release_date: "1959-04-15".to_string(),
        genre: "Western".to_string(),
        price: "3.99".to_string(),
        rating: "R".to_string(),
    }
}

#[test]
fn index_filters_and_lists_all_genres() {
    let conn = seeded();
    let controller = controller(&conn);

    let view = controller
        .index(Some("Comedy"), Some("2"))
        .unwrap()
        .into_view()
        .unwrap();

    assert_eq!(view.movies.len(), 1);
    assert_eq!(view.movies[0].title, "Ghostbusters 2");
    assert_eq!(view.genres, vec!["Comedy", "Romantic Comedy", "Western"]);
    assert_eq!(view.movie_genre.as_deref(), Some("Comedy"));
    assert_eq!(view.search_string.as_deref(), Some("2"));
}

#[test]
fn index_ignores_blank_filters() {
    let conn = seeded();
    let view = controller(&conn)
        .index(Some(""), Some("   "))
        .unwrap()
        .into_view()
        .unwrap();

    assert_eq!(view.movies.len(), 4);
    assert_eq!(view.movie_genre, None);
    assert_eq!(view.search_string, None);
}

#[test]
fn missing_or_unknown_id_is_not_found() {
    let conn = seeded();
    let controller = controller(&conn);

    assert_eq!(controller.details(None).unwrap(), ActionResult::NotFound);
    assert_eq!(controller.details(Some(999)).unwrap(), ActionResult::NotFound);
    assert!(matches!(
        controller.edit_form(None).unwrap(),
        ActionResult::NotFound
    ));
    assert!(matches!(
        controller.delete_form(Some(999)).unwrap(),
        ActionResult::NotFound
    ));
    assert!(matches!(
        controller
            .edit(Some(TOKEN), None, "1", form("Rio Bravo"))
            .unwrap(),
        ActionResult::NotFound
    ));
    assert!(matches!(
        controller
            .edit(Some(TOKEN), Some(999), "1", form("Rio Bravo"))
            .unwrap(),
        ActionResult::NotFound
    ));
}

#[test]
fn mutating_actions_require_the_session_token() {
    let conn = seeded();
    let controller = controller(&conn);
    let id = rio_bravo_id(&conn);

    assert!(matches!(
        controller.create(None, form("Red River")).unwrap(),
        ActionResult::BadRequest(_)
    ));
    assert!(matches!(
        controller
            .edit(Some("forged"), Some(id), "1", form("El Dorado"))
            .unwrap(),
        ActionResult::BadRequest(_)
    ));
    assert!(matches!(
        controller.delete_confirmed(Some("forged"), id).unwrap(),
        ActionResult::BadRequest(_)
    ));

    let view = controller.index(None, None).unwrap().into_view().unwrap();
    assert_eq!(view.movies.len(), 4);
    assert!(view.movies.iter().any(|movie| movie.title == "Rio Bravo"));
}

#[test]
fn create_redirects_on_success_and_redisplays_on_errors() {
    let conn = seeded();
    let controller = controller(&conn);

    assert_eq!(
        controller.create(Some(TOKEN), form("Red River")).unwrap(),
        ActionResult::RedirectToIndex
    );

    let mut bad = form("Red River");
    bad.genre = "sci-fi".to_string();
    bad.price = "cheap".to_string();
    let view = controller
        .create(Some(TOKEN), bad.clone())
        .unwrap()
        .into_view()
        .unwrap();
    assert_eq!(view.form, bad);
    assert_eq!(
        view.model_state.errors_for("Price"),
        ["The value 'cheap' is not valid for Price.".to_string()]
    );

    bad.price = "4.99".to_string();
    let view = controller
        .create(Some(TOKEN), bad)
        .unwrap()
        .into_view()
        .unwrap();
    assert_eq!(view.model_state.errors_for("Genre").len(), 1);
    assert_eq!(
        controller.index(None, None).unwrap().into_view().unwrap().movies.len(),
        5
    );
}

#[test]
fn edit_round_trip_uses_the_loaded_version() {
    let conn = seeded();
    let controller = controller(&conn);
    let id = rio_bravo_id(&conn);

    let loaded = controller.edit_form(Some(id)).unwrap().into_view().unwrap();
    assert_eq!(loaded.request_token, TOKEN);
    let version = loaded.row_version.unwrap();

    let mut edited = loaded.form;
    edited.price = "4.99".to_string();
    assert_eq!(
        controller
            .edit(Some(TOKEN), Some(id), &version, edited)
            .unwrap(),
        ActionResult::RedirectToIndex
    );

    let movie = controller.details(Some(id)).unwrap().into_view().unwrap();
    assert_eq!(movie.price.to_string(), "4.99");
    assert_ne!(movie.version.to_string(), version);
}

#[test]
fn stale_edit_shows_current_values_and_the_new_version() {
    let conn = seeded();
    let controller = controller(&conn);
    let id = rio_bravo_id(&conn);
    let stale = controller
        .edit_form(Some(id))
        .unwrap()
        .into_view()
        .unwrap()
        .row_version
        .unwrap();

    let mut first = form("Rio Bravo");
    first.price = "5.99".to_string();
    assert_eq!(
        controller
            .edit(Some(TOKEN), Some(id), &stale, first)
            .unwrap(),
        ActionResult::RedirectToIndex
    );

    let mut second = form("Rio Lobo");
    second.price = "2.99".to_string();
    let view = controller
        .edit(Some(TOKEN), Some(id), &stale, second.clone())
        .unwrap()
        .into_view()
        .unwrap();

    assert_eq!(view.form, second);
    assert_eq!(
        view.model_state.errors_for("Title"),
        ["Current value: Rio Bravo".to_string()]
    );
    assert_eq!(
        view.model_state.errors_for("Price"),
        ["Current value: 5.99".to_string()]
    );
    assert!(view.model_state.errors_for("Genre").is_empty());
    assert_eq!(
        view.model_state.form_errors(),
        [CONCURRENCY_CONFLICT_MESSAGE.to_string()]
    );

    let current = controller.details(Some(id)).unwrap().into_view().unwrap();
    assert_eq!(current.title, "Rio Bravo");
    assert_eq!(view.row_version, Some(current.version.to_string()));

    // Resubmitting with the version carried by the conflict view wins.
    assert_eq!(
        controller
            .edit(Some(TOKEN), Some(id), &current.version.to_string(), second)
            .unwrap(),
        ActionResult::RedirectToIndex
    );
}

#[test]
fn editing_a_deleted_movie_reports_deleted_by_another_user() {
    let conn = seeded();
    let controller = controller(&conn);
    let id = rio_bravo_id(&conn);
    let version = controller
        .edit_form(Some(id))
        .unwrap()
        .into_view()
        .unwrap()
        .row_version
        .unwrap();

    assert_eq!(
        controller.delete_confirmed(Some(TOKEN), id).unwrap(),
        ActionResult::RedirectToIndex
    );

    let view = controller
        .edit(Some(TOKEN), Some(id), &version, form("Rio Bravo"))
        .unwrap()
        .into_view()
        .unwrap();
    assert_eq!(
        view.model_state.form_errors(),
        [DELETED_BY_ANOTHER_USER_MESSAGE.to_string()]
    );
    assert_eq!(view.row_version, None);
}

#[test]
fn unreadable_version_token_is_reported_on_the_form() {
    let conn = seeded();
    let controller = controller(&conn);
    let id = rio_bravo_id(&conn);

    let view = controller
        .edit(Some(TOKEN), Some(id), "not-a-version", form("Rio Lobo"))
        .unwrap()
        .into_view()
        .unwrap();
    assert_eq!(
        view.model_state.form_errors(),
        [INVALID_VERSION_MESSAGE.to_string()]
    );

    let movie = controller.details(Some(id)).unwrap().into_view().unwrap();
    assert_eq!(movie.title, "Rio Bravo");
}

#[test]
fn delete_confirmed_succeeds_when_already_gone() {
    let conn = seeded();
    let controller = controller(&conn);
    let id = rio_bravo_id(&conn);

    assert_eq!(
        controller.delete_confirmed(Some(TOKEN), id).unwrap(),
        ActionResult::RedirectToIndex
    );
    assert_eq!(
        controller.delete_confirmed(Some(TOKEN), id).unwrap(),
        ActionResult::RedirectToIndex
    );
    assert_eq!(controller.details(Some(id)).unwrap(), ActionResult::NotFound);
}

#[test]
fn form_view_serializes_with_camel_case_keys() {
    let conn = seeded();
    let controller = controller(&conn);
    let id = rio_bravo_id(&conn);

    let view = controller.edit_form(Some(id)).unwrap().into_view().unwrap();
    let json = serde_json::to_value(&view).unwrap();

    assert_eq!(json["form"]["releaseDate"], "1959-04-15");
    assert_eq!(json["rowVersion"], "1");
    assert_eq!(json["requestToken"], TOKEN);
    assert_eq!(json["modelState"], serde_json::to_value(ModelState::default()).unwrap());
}

#[test]
fn patch_edit_changes_only_the_provided_values() {
    let conn = seeded();
    let controller = controller(&conn);
    let id = rio_bravo_id(&conn);
    let before = controller.details(Some(id)).unwrap().into_view().unwrap();

    let patch = MovieFormPatch {
        price: Some("4.49".to_string()),
        ..MovieFormPatch::default()
    };
    assert_eq!(
        controller
            .edit_patch(Some(TOKEN), Some(id), &before.version.to_string(), &patch)
            .unwrap(),
        ActionResult::RedirectToIndex
    );

    let after = controller.details(Some(id)).unwrap().into_view().unwrap();
    assert_eq!(after.price.to_string(), "4.49");
    assert_eq!(after.title, before.title);
    assert_eq!(after.release_date, before.release_date);
    assert_ne!(after.version, before.version);
}

#[test]
fn patch_edit_of_deleted_movie_reports_deleted_by_another_user() {
    let conn = seeded();
    let controller = controller(&conn);
    let id = rio_bravo_id(&conn);
    let version = controller
        .details(Some(id))
        .unwrap()
        .into_view()
        .unwrap()
        .version
        .to_string();
    controller.delete_confirmed(Some(TOKEN), id).unwrap();

    let patch = MovieFormPatch {
        title: Some("Rio Lobo".to_string()),
        ..MovieFormPatch::default()
    };
    let view = controller
        .edit_patch(Some(TOKEN), Some(id), &version, &patch)
        .unwrap()
        .into_view()
        .unwrap();
    assert_eq!(
        view.model_state.form_errors(),
        [DELETED_BY_ANOTHER_USER_MESSAGE.to_string()]
    );
    assert_eq!(view.form.title, "Rio Lobo");

    assert_eq!(
        controller
            .edit_patch(Some(TOKEN), Some(id + 100), "1", &patch)
            .unwrap(),
        ActionResult::NotFound
    );
}

#[test]
fn stale_patch_edit_reports_conflict_with_current_version() {
    let conn = seeded();
    let controller = controller(&conn);
    let id = rio_bravo_id(&conn);
    let stale = controller
        .details(Some(id))
        .unwrap()
        .into_view()
        .unwrap()
        .version
        .to_string();

    let first = MovieFormPatch {
        rating: Some("PG".to_string()),
        ..MovieFormPatch::default()
    };
    controller
        .edit_patch(Some(TOKEN), Some(id), &stale, &first)
        .unwrap();

    let second = MovieFormPatch {
        rating: Some("G".to_string()),
        ..MovieFormPatch::default()
    };
    let view = controller
        .edit_patch(Some(TOKEN), Some(id), &stale, &second)
        .unwrap()
        .into_view()
        .unwrap();

    assert_eq!(
        view.model_state.errors_for("Rating"),
        ["Current value: PG".to_string()]
    );
    assert_eq!(view.form.rating, "G");
    let current = controller.details(Some(id)).unwrap().into_view().unwrap();
    assert_eq!(view.row_version, Some(current.version.to_string()));
}
