//! People, films and starships commands

use crate::cli::EntityCommands;
use crate::cli::args::GlobalOptions;
use crate::cli::handlers::{run_get_command, run_list_command};
use crate::error::Result;
use crate::models::{FilmDisplay, PersonDisplay, StarshipDisplay};
use crate::swapi::{Film, Person, Starship};

pub async fn people(command: &EntityCommands, opts: &GlobalOptions) -> Result<()> {
    match command {
        EntityCommands::List { search } => {
            let search = search.as_deref();
            run_list_command::<Person, PersonDisplay, _, _>(opts, "people", |svc| async move {
                svc.list_people(search).await
            })
            .await
        }
        EntityCommands::Get { id } => {
            let id = id.to_string();
            run_get_command::<Person, PersonDisplay, _, _>(opts, |svc| async move {
                svc.get_person_by_id(&id).await
            })
            .await
        }
    }
}

pub async fn films(command: &EntityCommands, opts: &GlobalOptions) -> Result<()> {
    match command {
        EntityCommands::List { search } => {
            let search = search.as_deref();
            run_list_command::<Film, FilmDisplay, _, _>(opts, "films", |svc| async move {
                svc.list_films(search).await
            })
            .await
        }
        EntityCommands::Get { id } => {
            let id = id.to_string();
            run_get_command::<Film, FilmDisplay, _, _>(opts, |svc| async move {
                svc.get_film_by_id(&id).await
            })
            .await
        }
    }
}

pub async fn starships(command: &EntityCommands, opts: &GlobalOptions) -> Result<()> {
    match command {
        EntityCommands::List { search } => {
            let search = search.as_deref();
            run_list_command::<Starship, StarshipDisplay, _, _>(
                opts,
                "starships",
                |svc| async move { svc.list_starships(search).await },
            )
            .await
        }
        EntityCommands::Get { id } => {
            let id = id.to_string();
            run_get_command::<Starship, StarshipDisplay, _, _>(opts, |svc| async move {
                svc.get_starship_by_id(&id).await
            })
            .await
        }
    }
}
