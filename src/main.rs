//! Shape Stacker entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, HtmlInputElement, PointerEvent};

    use shape_stacker::config::Viewport;
    use shape_stacker::consts::*;
    use shape_stacker::leaderboard::{LeaderboardError, RestLeaderboard, submit_and_refresh};
    use shape_stacker::renderer::CanvasRenderer;
    use shape_stacker::session::SessionError;
    use shape_stacker::{
        GameConfig, LeaderboardClient, LeaderboardView, LocalHighScore, RoundEvent, ScoreEntry,
        Session,
    };

    /// Game instance holding all state
    struct Game {
        session: Session<LocalHighScore>,
        renderer: Option<CanvasRenderer>,
        last_time: f64,
        /// 1 Hz ticker handle, tagged with the session generation it serves
        timer: Option<(i32, u32)>,
    }

    impl Game {
        fn new(config: GameConfig, seed: u64) -> Self {
            Self {
                session: Session::new(config, LocalHighScore::new(), seed),
                renderer: None,
                last_time: 0.0,
                timer: None,
            }
        }

        fn render(&self) {
            if let Some(ref renderer) = self.renderer {
                let hud = self.session.hud();
                if let Err(e) = renderer.render(self.session.round(), self.session.physics(), &hud)
                {
                    log::warn!("Render error: {:?}", e);
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = document() else { return };
            let hud = self.session.hud();

            if let Some(el) = document.get_element_by_id("current-score") {
                el.set_text_content(Some(&hud.score));
            }
            if let Some(el) = document.get_element_by_id("high-score") {
                el.set_text_content(Some(&hud.high_score));
            }
        }

        fn stop_timer(&mut self) {
            if let Some((handle, _)) = self.timer.take() {
                if let Some(window) = web_sys::window() {
                    window.clear_interval_with_handle(handle);
                }
            }
        }
    }

    /// Shared handles the async leaderboard tasks need
    #[derive(Clone)]
    struct Board {
        client: Rc<RestLeaderboard>,
        view: Rc<RefCell<LeaderboardView>>,
        limit: usize,
    }

    impl Board {
        fn refresh(&self) {
            let board = self.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = board.client.fetch_top(board.limit).await;
                board.apply(result);
            });
        }

        fn submit(&self, entry: ScoreEntry) {
            let board = self.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = submit_and_refresh(&*board.client, &entry, board.limit).await;
                board.apply(result);
            });
        }

        fn apply(&self, result: Result<Vec<ScoreEntry>, LeaderboardError>) {
            let changed = self.view.borrow_mut().apply_fetch(result);
            if changed {
                render_leaderboard(&self.view.borrow());
            }
        }
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn render_leaderboard(view: &LeaderboardView) {
        let Some(document) = document() else { return };
        let Some(list) = document.get_element_by_id("leaderboard-list") else {
            return;
        };

        list.set_inner_html("");
        for row in view.rows() {
            if let Ok(li) = document.create_element("li") {
                li.set_text_content(Some(&row));
                let _ = list.append_child(&li);
            }
        }
    }

    fn set_hidden(id: &str, hidden: bool) {
        if let Some(el) = document().and_then(|d| d.get_element_by_id(id)) {
            let classes = el.class_list();
            if hidden {
                let _ = classes.add_1("hidden");
            } else {
                let _ = classes.remove_1("hidden");
            }
        }
    }

    /// Add a class now and take it off again after `ms`
    fn flash_class(id: &str, class: &'static str, ms: i32) {
        let Some(el) = document().and_then(|d| d.get_element_by_id(id)) else {
            return;
        };
        let _ = el.class_list().add_1(class);
        let closure = Closure::once_into_js(move || {
            let _ = el.class_list().remove_1(class);
        });
        if let Some(window) = web_sys::window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.unchecked_ref(),
                ms,
            );
        }
    }

    fn show_initials_modal() {
        set_hidden("initials-modal", false);
        if let Some(input) = document()
            .and_then(|d| d.get_element_by_id("initials-input"))
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        {
            input.set_value("");
            let _ = input.focus();
        }
    }

    /// React to whatever the round reported since the last call
    fn process_notices(game: &Rc<RefCell<Game>>) {
        let notices = game.borrow_mut().session.drain_notices();
        for notice in notices {
            match notice {
                RoundEvent::TimerStarted => start_timer(game),
                RoundEvent::Locked { final_score } => {
                    log::info!("Final count: {}", final_score);
                    game.borrow_mut().stop_timer();
                }
                RoundEvent::NewRecord { .. } => {
                    set_hidden("new-record-badge", false);
                    flash_class("new-record-badge", "visible", 2000);
                    flash_class("high-score", "flash", 1500);
                }
                RoundEvent::PromptInitials => show_initials_modal(),
                _ => {}
            }
        }
    }

    fn start_timer(game: &Rc<RefCell<Game>>) {
        let generation = game.borrow().session.generation();
        let tick_game = game.clone();
        let closure = Closure::<dyn FnMut()>::new(move || {
            {
                let mut g = tick_game.borrow_mut();
                // A reset may have replaced the session this timer was started for
                if g.session.generation() != generation {
                    return;
                }
                g.session.tick();
            }
            process_notices(&tick_game);
        });

        let Some(window) = web_sys::window() else { return };
        match window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            TICK_INTERVAL_MS,
        ) {
            Ok(handle) => {
                let mut g = game.borrow_mut();
                g.stop_timer();
                g.timer = Some((handle, generation));
            }
            Err(e) => log::error!("Unable to start timer: {:?}", e),
        }
        closure.forget();
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Failed to init logger: {}", e).into());
        }

        log::info!("Shape Stacker starting...");

        let Some(document) = document() else {
            log::error!("No document");
            return;
        };

        let canvas: HtmlCanvasElement = match document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into().ok())
        {
            Some(canvas) => canvas,
            None => {
                log::error!("No canvas element");
                return;
            }
        };

        // Size the playfield to the container
        let mut config = GameConfig::load();
        if let Some(container) = document.get_element_by_id("game-container") {
            config.viewport =
                Viewport::fit(container.client_width() as f32, container.client_height() as f32);
        }
        canvas.set_width(config.viewport.width as u32);
        canvas.set_height(config.viewport.height as u32);

        let board = Board {
            client: Rc::new(RestLeaderboard::new(config.leaderboard.clone())),
            view: Rc::new(RefCell::new(LeaderboardView::new(config.leaderboard.limit))),
            limit: config.leaderboard.limit,
        };

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(config, seed)));

        match CanvasRenderer::new(&canvas) {
            Ok(renderer) => game.borrow_mut().renderer = Some(renderer),
            Err(e) => log::error!("Canvas unavailable: {:?}", e),
        }

        game.borrow().update_hud();
        board.refresh();

        setup_input_handlers(&canvas, game.clone());
        setup_initials_modal(game.clone(), board);
        setup_reset_button(game.clone());
        setup_resize_handler(&canvas, game.clone());

        request_animation_frame(game);

        log::info!("Shape Stacker running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let canvas_clone = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
            let rect = canvas_clone.get_bounding_client_rect();
            let pos = Vec2::new(
                event.client_x() as f32 - rect.left() as f32,
                event.client_y() as f32 - rect.top() as f32,
            );
            game.borrow_mut().session.tap(pos);
            process_notices(&game);
        });
        let _ = canvas
            .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_initials_modal(game: Rc<RefCell<Game>>, board: Board) {
        let Some(document) = document() else { return };
        let Some(btn) = document.get_element_by_id("initials-submit") else {
            return;
        };

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            let raw = document()
                .and_then(|d| d.get_element_by_id("initials-input"))
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                .map(|input| input.value())
                .unwrap_or_default();

            let result = game.borrow_mut().session.submit_initials(&raw);
            match result {
                Ok(entry) => {
                    set_hidden("initials-modal", true);
                    board.submit(entry);
                }
                Err(SessionError::Initials(e)) => {
                    if let Some(window) = web_sys::window() {
                        let _ = window.alert_with_message(&e.to_string());
                    }
                }
                Err(SessionError::NoPrompt) => set_hidden("initials-modal", true),
            }
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_reset_button(game: Rc<RefCell<Game>>) {
        let Some(document) = document() else { return };
        let Some(btn) = document.get_element_by_id("reset-button") else {
            return;
        };

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            let seed = js_sys::Date::now() as u64;
            let mut g = game.borrow_mut();
            g.stop_timer();
            g.session.reset(seed);
            g.update_hud();
            set_hidden("initials-modal", true);
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Refit the canvas to its container; the field follows on the next reset
    fn setup_resize_handler(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut()>::new(move || {
            let Some(container) = document().and_then(|d| d.get_element_by_id("game-container"))
            else {
                return;
            };
            let viewport =
                Viewport::fit(container.client_width() as f32, container.client_height() as f32);
            let (width, height) = (viewport.width as u32, viewport.height as u32);
            canvas.set_width(width);
            canvas.set_height(height);

            let mut g = game.borrow_mut();
            if let Some(renderer) = g.renderer.as_mut() {
                renderer.resize(width, height);
            }
            g.session.set_viewport(viewport);
            g.render();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                PHYSICS_DT
            };
            g.last_time = time;

            g.session.update(dt);
            g.render();
            g.update_hud();
        }
        process_notices(&game);

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use shape_stacker::consts::{LEADERBOARD_LIMIT, PHYSICS_DT};
    use shape_stacker::leaderboard::{MemoryLeaderboard, submit_and_refresh};
    use shape_stacker::{GameConfig, LeaderboardView, LocalHighScore, RoundState, Session};

    env_logger::init();
    log::info!("Shape Stacker (native) starting...");
    log::info!("Native mode plays one scripted round headless - run with `trunk serve` for the web version");

    let config = match std::env::args().nth(1) {
        Some(path) => match GameConfig::from_path(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => GameConfig::default(),
    };

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let mut session = Session::new(config, LocalHighScore::new(), seed);
    let mut player = Pcg32::seed_from_u64(seed ^ 0x5eed);
    let field = *session.round().field();
    let frames_per_tick = (1.0 / PHYSICS_DT).round() as u32;

    while session.state() != RoundState::Locked {
        for frame in 0..frames_per_tick {
            // Roughly two drops a second while the clock runs
            let dropping = matches!(session.state(), RoundState::Idle | RoundState::Dropping);
            if dropping && frame % 30 == 0 {
                let x = player.random_range(field.left..field.right);
                session.tap(glam::Vec2::new(x, field.top - 10.0));
            }
            session.update(PHYSICS_DT);
        }
        session.tick();

        let hud = session.hud();
        match &hud.lock_in {
            Some(lock_in) => log::info!("{} | {}", lock_in, hud.shapes),
            None => log::info!("{} | {}", hud.timer, hud.shapes),
        }
    }

    let hud = session.hud();
    println!("{}", hud.shapes);
    println!("{}", hud.high_score);

    let board = MemoryLeaderboard::new();
    let mut view = LeaderboardView::new(LEADERBOARD_LIMIT);
    if session.prompt_open() {
        match session.submit_initials("CPU") {
            Ok(entry) => {
                view.apply_fetch(pollster::block_on(submit_and_refresh(
                    &board,
                    &entry,
                    LEADERBOARD_LIMIT,
                )));
            }
            Err(e) => log::warn!("Not submitted: {}", e),
        }
    }
    for row in view.rows() {
        println!("{}", row);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
