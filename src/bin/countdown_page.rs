//! A terminal page with a countdown timer and a delayed outcome form.
//!
//! Configuration is read from `countdown.toml` in the working directory and
//! `COUNTDOWN_*` environment variables. Log verbosity follows `RUST_LOG`.

use bubbletea_rs::{Cmd, KeyMsg, Model as BubbleTeaModel, Msg, Program, WindowSizeMsg};
use countdown_widgets::config::{self, Config};
use countdown_widgets::countdown::{self, CountdownTimer, FinishedMsg, Markup};
use countdown_widgets::datepicker::CloseMsg;
use countdown_widgets::document::Document;
use countdown_widgets::key::{self, Binding, KeyMap};
use countdown_widgets::outcome::{self, DelayedOutcomeForm};
use countdown_widgets::toast::{self, ExpireMsg, Toasts};
use countdown_widgets::{form, Component, SystemClock};
use crossterm::event::{KeyCode, KeyModifiers};
use once_cell::sync::OnceCell;
use std::fs::File;
use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;

// `Model::init` takes no arguments, so the loaded configuration is
// published here before the program starts.
static CONFIG: OnceCell<Config> = OnceCell::new();

fn config() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Countdown,
    Outcome,
}

struct AppKeyMap {
    next_pane: Binding,
    quit: Binding,
}

impl Default for AppKeyMap {
    fn default() -> Self {
        Self {
            next_pane: Binding::new(vec![(KeyCode::Char('n'), KeyModifiers::CONTROL)])
                .with_help("ctrl+n", "next widget"),
            quit: Binding::new(vec![(KeyCode::Char('c'), KeyModifiers::CONTROL)])
                .with_help("ctrl+c", "quit"),
        }
    }
}

impl KeyMap for AppKeyMap {
    fn short_help(&self) -> Vec<&Binding> {
        vec![&self.next_pane, &self.quit]
    }

    fn full_help(&self) -> Vec<Vec<&Binding>> {
        vec![vec![&self.next_pane, &self.quit]]
    }
}

struct App {
    countdown: CountdownTimer,
    outcome: DelayedOutcomeForm,
    toasts: toast::Model,
    pane: Pane,
    keymap: AppKeyMap,
}

fn promise_form() -> form::Model {
    form::Model::new()
        .with_text("delay", "Delay (ms)", true)
        .with_choice("state", "State", &[outcome::FULFILLED, "rejected"])
}

impl App {
    fn next_pane(&mut self) -> Option<Cmd> {
        self.pane = match self.pane {
            Pane::Countdown => Pane::Outcome,
            Pane::Outcome => Pane::Countdown,
        };
        match self.pane {
            Pane::Countdown => {
                self.outcome.blur();
                self.countdown.focus()
            }
            Pane::Outcome => {
                self.countdown.blur();
                self.outcome.focus()
            }
        }
    }

    fn on_key(&mut self, key_msg: &KeyMsg) -> Option<Cmd> {
        if self.keymap.quit.matches(key_msg) {
            return Some(bubbletea_rs::quit());
        }
        if self.keymap.next_pane.matches(key_msg) {
            return self.next_pane();
        }
        let forward = Box::new(KeyMsg {
            key: key_msg.key,
            modifiers: key_msg.modifiers,
        }) as Msg;
        if self.toasts.keymap.dismiss.matches(key_msg) {
            return self.toasts.update(forward);
        }
        match self.pane {
            Pane::Countdown => self.countdown.update(forward),
            Pane::Outcome => self.outcome.update(forward),
        }
    }

    fn help(&self) -> String {
        let pane = match self.pane {
            Pane::Countdown => key::short_help_view(&self.countdown.keymap),
            Pane::Outcome => self
                .outcome
                .form()
                .map(|form| key::short_help_view(&form.keymap))
                .unwrap_or_default(),
        };
        format!("{} • {}", pane, key::short_help_view(&self.keymap))
    }
}

impl BubbleTeaModel for App {
    fn init() -> (Self, Option<Cmd>) {
        let config = config();
        let toasts = Toasts::new(config.toast_timeout(), config.toast.max_visible);

        let mut doc = Document::new()
            .mount("div.timer-wrapper", Markup::default())
            .mount("form", promise_form());

        let mut countdown = CountdownTimer::initialize(
            &mut doc,
            &config.countdown.selector,
            Arc::new(SystemClock),
            Arc::new(toasts.clone()),
            config.countdown_options(),
        );
        let outcome =
            DelayedOutcomeForm::initialize(&mut doc, &config.form.selector, Arc::new(toasts.clone()));

        let focus_cmd = countdown.focus();
        let toasts = toast::Model::new(toasts);
        let expire_cmd = toasts.init();
        let app = Self {
            countdown,
            outcome,
            toasts,
            pane: Pane::Countdown,
            keymap: AppKeyMap::default(),
        };
        let cmd = match focus_cmd {
            Some(focus_cmd) => bubbletea_rs::batch(vec![focus_cmd, expire_cmd]),
            None => expire_cmd,
        };
        (app, Some(cmd))
    }

    fn update(&mut self, msg: Msg) -> Option<Cmd> {
        if let Some(key_msg) = msg.downcast_ref::<KeyMsg>() {
            return self.on_key(key_msg);
        }
        if msg.is::<ExpireMsg>() || msg.is::<WindowSizeMsg>() {
            return self.toasts.update(msg);
        }
        if let Some(done) = msg.downcast_ref::<FinishedMsg>() {
            tracing::info!(id = done.id, "countdown reached zero");
            return None;
        }
        if msg.is::<CloseMsg>() || msg.is::<countdown::StartMsg>() || msg.is::<countdown::TickMsg>()
        {
            return self.countdown.update(msg);
        }
        self.outcome.update(msg)
    }

    fn view(&self) -> String {
        let toasts = self.toasts.view();
        let mut sections = Vec::new();
        if !toasts.is_empty() {
            sections.push(toasts);
        }
        sections.push(self.countdown.view());
        sections.push(self.outcome.view());
        sections.push(self.help());
        sections.join("\n\n")
    }
}

fn init_tracer(config: &Config) -> std::io::Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    match &config.log_file {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .with(filter)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, load_error) = match Config::load(config::DEFAULT_FILE) {
        Ok(config) => (config, None),
        Err(err) => (Config::default(), Some(err)),
    };
    init_tracer(&config)?;
    if let Some(err) = load_error {
        tracing::error!(error = %err, "falling back to default configuration");
    }
    let _ = CONFIG.set(config);

    let program = Program::<App>::builder().alt_screen(true).build()?;
    program.run().await?;
    Ok(())
}
