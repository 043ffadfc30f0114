//! The interactive dashboard: a navbar, a menu, and the search view with
//! live city suggestions.

use anyhow::Result;
use inquire::{
    CustomUserError, Select, Text,
    autocompletion::{Autocomplete, Replacement},
};
use std::fmt;
use tracing::debug;
use weatherdash_core::{AuthState, Dashboard, Route, SuggestionPipeline};

use crate::{cli, prompt::prompt, view};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    Search,
    History,
    Login,
    Register,
    Logout,
    Quit,
}

impl MenuItem {
    /// Entries offered for the current session, in navbar order.
    fn for_state(state: &AuthState) -> Vec<Self> {
        if state.is_authenticated() {
            vec![Self::Search, Self::History, Self::Logout, Self::Quit]
        } else {
            vec![Self::Search, Self::Login, Self::Register, Self::Quit]
        }
    }

    fn route(self) -> Option<Route> {
        match self {
            Self::Search => Some(Route::Home),
            Self::History => Some(Route::History),
            Self::Login => Some(Route::Login),
            Self::Register => Some(Route::Register),
            Self::Logout | Self::Quit => None,
        }
    }
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Search => "Search weather",
            Self::History => "Search history",
            Self::Login => "Login",
            Self::Register => "Register",
            Self::Logout => "Logout",
            Self::Quit => "Quit",
        };
        f.write_str(label)
    }
}

pub async fn run(dash: Dashboard) -> Result<()> {
    loop {
        let state = dash.session().state();
        println!("\n{}", view::navbar(&state));

        let items = MenuItem::for_state(&state);
        let Some(choice) = prompt(move || Select::new("Go to:", items).prompt()).await? else {
            return Ok(());
        };

        // A stale menu can still point at a guarded view; resolve it against
        // the session as it is now.
        let choice = match choice.route().map(|r| r.resolve(&dash.session().state())) {
            Some(Route::Login) if choice != MenuItem::Login => MenuItem::Login,
            _ => choice,
        };

        match choice {
            MenuItem::Search => search_view(&dash).await?,
            MenuItem::History => cli::history(&dash).await?,
            MenuItem::Login => cli::login(&dash, None).await?,
            MenuItem::Register => cli::register(&dash, None, None).await?,
            MenuItem::Logout => {
                // The backend is told in the background.
                let _ = dash.session().logout();
                println!("Signed out.");
            }
            MenuItem::Quit => return Ok(()),
        }
    }
}

async fn search_view(dash: &Dashboard) -> Result<()> {
    let pipeline = dash.suggestions().clone();
    // Coming back to the prompt shows what the last query found.
    pipeline.reveal();
    let completer = CityCompleter::new(pipeline.clone());

    let answer = prompt(move || {
        Text::new("City:")
            .with_autocomplete(completer)
            .with_help_message("Type at least two letters for suggestions, Tab to complete")
            .prompt()
    })
    .await?;

    let Some(input) = answer else {
        pipeline.dismiss();
        return Ok(());
    };

    match pipeline.find(&input) {
        Some(suggestion) => {
            debug!(city = %suggestion.name, "Suggestion picked");
            // Failures are already reflected in the search state.
            let _ = dash.select_suggestion(&suggestion).await;
            print!("{}", view::home(&dash.search().state()));
        }
        None => {
            pipeline.dismiss();
            cli::show(dash, &input).await?;
        }
    }
    Ok(())
}

/// Feeds keystrokes into the suggestion pipeline.
///
/// Suggestions arrive asynchronously, so the list shown reflects the latest
/// completed fetch, which may trail the input by a keystroke.
#[derive(Debug, Clone)]
struct CityCompleter {
    pipeline: SuggestionPipeline,
    last_input: String,
}

impl CityCompleter {
    /// The prompt opens empty; that first empty input must not clear a
    /// revealed list.
    fn new(pipeline: SuggestionPipeline) -> Self {
        Self {
            pipeline,
            last_input: String::new(),
        }
    }
}

impl Autocomplete for CityCompleter {
    fn get_suggestions(&mut self, input: &str) -> Result<Vec<String>, CustomUserError> {
        if self.last_input != input {
            self.pipeline.on_query_change(input);
            self.last_input = input.to_string();
        }

        Ok(self
            .pipeline
            .state()
            .visible_items()
            .iter()
            .map(|s| s.label.clone())
            .collect())
    }

    fn get_completion(
        &mut self,
        _input: &str,
        highlighted_suggestion: Option<String>,
    ) -> Result<Replacement, CustomUserError> {
        Ok(highlighted_suggestion)
    }
}
