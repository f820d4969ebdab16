use std::io::{self, BufRead, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::Context;
use crawldeck_core::{
    guard, update, AppState, CredentialStore, Msg, Route, SessionStore, TICK_INTERVAL,
};
use crawldeck_engine::{EngineHandle, ReqwestApiClient, TokenSource};
use crawldeck_logging::{deck_error, deck_info, deck_warn};
use log::LevelFilter;

use super::config::{self, ConsoleConfig, CONFIG_FILE};
use super::effects::EffectRunner;
use super::logging;
use super::persistence::FileCredentialStore;
use super::ui::commands::{self, Input, HELP};
use super::ui::render;

/// Everything the main loop reacts to.
pub enum AppEvent {
    Msg(Msg),
    Line(String),
    InputClosed,
}

pub fn run_app() -> anyhow::Result<()> {
    let (config, config_error) = config::load_or_default(Path::new(CONFIG_FILE));
    logging::initialize(config.log_to, LevelFilter::Info);
    if let Some(err) = config_error {
        deck_warn!("Using default configuration: {}", err);
    }
    deck_info!("crawldeck starting against {}", config.api_base_url);

    let mut app = App::start(&config)?;
    app.run();
    deck_info!("crawldeck exiting");
    Ok(())
}

struct App {
    state: AppState,
    runner: EffectRunner,
    credentials: Arc<FileCredentialStore>,
    event_rx: mpsc::Receiver<AppEvent>,
    needs_render: bool,
}

impl App {
    fn start(config: &ConsoleConfig) -> anyhow::Result<Self> {
        let credentials = Arc::new(FileCredentialStore::new(config.state_dir.clone()));
        let tokens: Arc<dyn TokenSource> = credentials.clone();
        let api = ReqwestApiClient::new(config.api_settings(), tokens)
            .context("building the HTTP client")?;
        let engine = EngineHandle::new(Arc::new(api)).context("starting the engine")?;

        let storage: Arc<dyn CredentialStore> = credentials.clone();
        let session = SessionStore::open(storage);

        let (event_tx, event_rx) = mpsc::channel();
        spawn_input_reader(event_tx.clone());
        spawn_ticker(event_tx.clone());
        let runner = EffectRunner::new(engine, session, event_tx);

        let mut app = Self {
            state: AppState::with_settings(config.console_settings()),
            runner,
            credentials,
            event_rx,
            needs_render: true,
        };
        let snapshot = app.runner.snapshot();
        app.dispatch(Msg::SessionChanged(snapshot));
        Ok(app)
    }

    fn run(&mut self) {
        while let Ok(event) = self.event_rx.recv() {
            match event {
                AppEvent::Msg(Msg::Tick) => {
                    self.dispatch(Msg::Tick);
                    self.render_if_needed();
                }
                AppEvent::Msg(msg) => self.dispatch(msg),
                AppEvent::Line(line) => match commands::parse(&line) {
                    Ok(Input::Quit) => break,
                    Ok(input) => self.handle_input(input),
                    Err(message) => println!("{message}"),
                },
                AppEvent::InputClosed => break,
            }
        }
    }

    fn handle_input(&mut self, input: Input) {
        match input {
            Input::Msgs(msgs) => {
                for msg in msgs {
                    self.dispatch(msg);
                }
            }
            Input::Go(route) => self.navigate(route),
            Input::Help => println!("{HELP}"),
            Input::Empty => self.needs_render = true,
            Input::Quit => {}
        }
    }

    fn navigate(&mut self, requested: Route) {
        let route = guard::admit(requested, self.credentials.as_ref());
        if route != requested {
            deck_info!("Guard redirected {:?} to {:?}", requested, route);
        }
        self.dispatch(Msg::Navigate(route));
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            self.needs_render = true;
        }
        self.state = state;
        self.runner.enqueue(effects);
    }

    fn render_if_needed(&mut self) {
        if !self.needs_render {
            return;
        }
        self.needs_render = false;
        let view = self.state.view();
        let text = match panic::catch_unwind(AssertUnwindSafe(|| render::render(&view))) {
            Ok(text) => text,
            Err(_) => {
                deck_error!("Render panicked on route {:?}", view.route);
                format!("{}\n", render::FALLBACK)
            }
        };
        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "\n{text}> ");
        let _ = stdout.flush();
    }
}

fn spawn_input_reader(event_tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if event_tx.send(AppEvent::Line(line)).is_err() {
                return;
            }
        }
        let _ = event_tx.send(AppEvent::InputClosed);
    });
}

fn spawn_ticker(event_tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        while event_tx.send(AppEvent::Msg(Msg::Tick)).is_ok() {
            thread::sleep(TICK_INTERVAL);
        }
    });
}
