//! Browser bindings
//!
//! Wraps the navigation engine for a JavaScript host. The host hands over its
//! replay player once it is ready; from then on this module owns the polling
//! timer, the `hashchange` and `keydown` listeners, and writes the location
//! fragment through `history.replaceState`.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, KeyboardEvent, Window};

use crate::annotations::{parse_annotations, AnnotationFile};
use crate::config::PlayerConfig;
use crate::error::{RehearseurError, Result};
use crate::navigation::keyboard::is_editable_target;
use crate::navigation::{LocationHash, NavigationEngine, NavigationSource, NavigationState, PlayerHandle};
use crate::presentation::{build_toc, MarkerLayer, ProgressBarBounds};

/// Selector of the progress bar rendered by the replay player
const PROGRESS_BAR_SELECTOR: &str = ".rr-progress";

#[wasm_bindgen]
extern "C" {
    /// Replay player supplied by the host.
    ///
    /// Expected shape: `goto(ms)`, `play()`, `pause()`, `getIsPlaying()` and
    /// `getCurrentTime()` (returning `undefined` while unavailable).
    pub type ReplayPlayer;

    #[wasm_bindgen(method)]
    fn goto(this: &ReplayPlayer, time_ms: f64);

    #[wasm_bindgen(method)]
    fn play(this: &ReplayPlayer);

    #[wasm_bindgen(method)]
    fn pause(this: &ReplayPlayer);

    #[wasm_bindgen(method, js_name = "getIsPlaying")]
    fn get_is_playing(this: &ReplayPlayer) -> bool;

    #[wasm_bindgen(method, js_name = "getCurrentTime")]
    fn get_current_time(this: &ReplayPlayer) -> Option<f64>;
}

fn console_log(message: &str) {
    web_sys::console::log_1(&format!("[rehearseur] {}", message).into());
}

fn browser_window() -> Result<Window> {
    web_sys::window().ok_or_else(|| RehearseurError::Browser("no global window".to_string()))
}

/// [`PlayerHandle`] over the host's player object
pub struct JsPlayer {
    inner: ReplayPlayer,
}

impl PlayerHandle for JsPlayer {
    fn goto(&mut self, ms: u64) {
        self.inner.goto(ms as f64);
    }

    fn play(&mut self) {
        self.inner.play();
    }

    fn pause(&mut self) {
        self.inner.pause();
    }

    fn is_playing(&self) -> bool {
        self.inner.get_is_playing()
    }

    fn current_time(&self) -> Option<u64> {
        self.inner
            .get_current_time()
            .filter(|time| time.is_finite() && *time >= 0.0)
            .map(|time| time as u64)
    }
}

/// [`LocationHash`] over `window.location` and `window.history`
pub struct BrowserLocation {
    window: Window,
}

impl BrowserLocation {
    pub fn new() -> Result<Self> {
        Ok(Self {
            window: browser_window()?,
        })
    }
}

impl LocationHash for BrowserLocation {
    fn read(&self) -> Option<String> {
        let hash = self.window.location().hash().ok()?;
        let fragment = hash.strip_prefix('#').unwrap_or(&hash);
        if fragment.is_empty() {
            None
        } else {
            Some(fragment.to_string())
        }
    }

    fn write(&mut self, id: &str) {
        let url = format!("#{}", urlencoding::encode(id));
        let result = self
            .window
            .history()
            .and_then(|history| history.replace_state_with_url(&JsValue::NULL, "", Some(&url)));
        if let Err(err) = result {
            console_log(&format!("Could not update location to {}: {:?}", url, err));
        }
    }
}

type BrowserEngine = NavigationEngine<JsPlayer, BrowserLocation>;

struct Shared {
    engine: BrowserEngine,
    file: AnnotationFile,
    markers: MarkerLayer,
    on_change: Option<js_sys::Function>,
    last_state: Option<NavigationState>,
}

/// Polling timer and window listeners of one attached player.
///
/// Dropping it cancels all of them.
struct Listeners {
    window: Window,
    interval_id: i32,
    _tick: Closure<dyn FnMut()>,
    hash_change: Closure<dyn FnMut(Event)>,
    key_down: Closure<dyn FnMut(KeyboardEvent)>,
}

impl Listeners {
    fn install(shared: &Rc<RefCell<Shared>>, polling_interval_ms: u32) -> Result<Self> {
        let window = browser_window()?;

        let tick = {
            let shared = Rc::clone(shared);
            Closure::wrap(Box::new(move || {
                if with_shared(&shared, |inner| inner.engine.tick()).is_some() {
                    notify(&shared);
                }
            }) as Box<dyn FnMut()>)
        };

        let hash_change = {
            let shared = Rc::clone(shared);
            Closure::wrap(Box::new(move |_event: Event| {
                let navigated = with_shared(&shared, |inner| inner.engine.navigate_to_hash(false));
                if navigated == Some(true) {
                    notify(&shared);
                }
            }) as Box<dyn FnMut(Event)>)
        };

        let key_down = {
            let shared = Rc::clone(shared);
            Closure::wrap(Box::new(move |event: KeyboardEvent| {
                let typing = event
                    .target()
                    .and_then(|target| target.dyn_into::<web_sys::Element>().ok())
                    .is_some_and(|element| is_editable_target(&element.tag_name()));
                if typing {
                    return;
                }

                let key = event.key();
                let handled = with_shared(&shared, |inner| inner.engine.handle_key(&key));
                if handled == Some(true) {
                    event.prevent_default();
                    notify(&shared);
                }
            }) as Box<dyn FnMut(KeyboardEvent)>)
        };

        let interval_id = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                tick.as_ref().unchecked_ref(),
                polling_interval_ms.min(i32::MAX as u32) as i32,
            )
            .map_err(|err| RehearseurError::Browser(format!("setInterval failed: {:?}", err)))?;

        // From here on `Drop` clears the interval if a listener fails below
        let listeners = Self {
            window,
            interval_id,
            _tick: tick,
            hash_change,
            key_down,
        };

        listeners
            .window
            .add_event_listener_with_callback("hashchange", listeners.hash_change.as_ref().unchecked_ref())
            .map_err(|err| RehearseurError::Browser(format!("hashchange listener: {:?}", err)))?;
        listeners
            .window
            .add_event_listener_with_callback("keydown", listeners.key_down.as_ref().unchecked_ref())
            .map_err(|err| RehearseurError::Browser(format!("keydown listener: {:?}", err)))?;

        Ok(listeners)
    }
}

impl Drop for Listeners {
    fn drop(&mut self) {
        self.window.clear_interval_with_handle(self.interval_id);
        // Removing a listener that was never added is harmless
        let _ = self
            .window
            .remove_event_listener_with_callback("hashchange", self.hash_change.as_ref().unchecked_ref());
        let _ = self
            .window
            .remove_event_listener_with_callback("keydown", self.key_down.as_ref().unchecked_ref());
    }
}

/// Run `f` on the shared state.
///
/// The engine calls into the host's player (`goto`, `pause`) while the state
/// is borrowed. If the player's own event handlers call back into us
/// synchronously, the state is still borrowed further up the stack; such a
/// nested call is dropped and `None` returned.
fn with_shared<R>(shared: &Rc<RefCell<Shared>>, f: impl FnOnce(&mut Shared) -> R) -> Option<R> {
    match shared.try_borrow_mut() {
        Ok(mut inner) => Some(f(&mut inner)),
        Err(_) => {
            console_log("Ignored a nested call made while the engine was busy");
            None
        }
    }
}

fn busy() -> RehearseurError {
    RehearseurError::Browser("called back while the engine was busy".to_string())
}

/// Call the host's change callback if the state moved since the last call.
///
/// The borrow is released before calling out, so the callback may call back
/// into the player.
fn notify(shared: &Rc<RefCell<Shared>>) {
    let pending = with_shared(shared, |inner| {
        let state = inner.engine.state();
        if inner.last_state.as_ref() == Some(&state) {
            return None;
        }
        inner.last_state = Some(state.clone());
        inner.on_change.clone().map(|callback| (callback, state))
    });
    let Some((callback, state)) = pending.flatten() else {
        return;
    };

    match serde_wasm_bindgen::to_value(&state) {
        Ok(value) => {
            if let Err(err) = callback.call1(&JsValue::NULL, &value) {
                console_log(&format!("onChange callback threw: {:?}", err));
            }
        }
        Err(err) => console_log(&format!("Could not serialize state: {}", err)),
    }
}

fn config_from_js(config: JsValue) -> Result<PlayerConfig> {
    let config = if config.is_undefined() || config.is_null() {
        PlayerConfig::default()
    } else {
        serde_wasm_bindgen::from_value::<PlayerConfig>(config)?
    };
    config.validate()?;
    Ok(config)
}

fn clamp_ms(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value as u64
    } else {
        0
    }
}

/// Parse an annotation document without creating a player
#[wasm_bindgen(js_name = "parseAnnotations")]
pub fn parse_annotations_js(markdown: &str) -> std::result::Result<JsValue, JsValue> {
    let file = parse_annotations(markdown);
    Ok(serde_wasm_bindgen::to_value(&file)?)
}

/// Annotation overlay for one replay player instance.
///
/// Calls the player makes back into this object from inside `goto` or
/// `pause` are ignored; commands returning a value report them as errors.
#[wasm_bindgen]
pub struct AnnotationPlayer {
    shared: Rc<RefCell<Shared>>,
    listeners: Option<Listeners>,
}

#[wasm_bindgen]
impl AnnotationPlayer {
    /// Parse `markdown` and prepare an engine. Nothing happens until a
    /// player is attached.
    #[wasm_bindgen(constructor)]
    pub fn new(markdown: &str, config: JsValue) -> std::result::Result<AnnotationPlayer, JsValue> {
        let config = config_from_js(config)?;
        let file = parse_annotations(markdown);
        let engine = NavigationEngine::new(config, &file, BrowserLocation::new()?);

        console_log(&format!(
            "Loaded \"{}\": {} annotations in {} sections",
            file.title,
            file.annotations.len(),
            file.sections.len()
        ));

        Ok(Self {
            shared: Rc::new(RefCell::new(Shared {
                engine,
                file,
                markers: MarkerLayer::new(),
                on_change: None,
                last_state: None,
            })),
            listeners: None,
        })
    }

    /// The player is ready: start polling, listen for fragment changes and
    /// shortcuts, and apply the fragment the page was opened with.
    #[wasm_bindgen(js_name = "attachPlayer")]
    pub fn attach_player(&mut self, player: ReplayPlayer) -> std::result::Result<(), JsValue> {
        // Replacing a player tears the previous timer down first
        self.listeners = None;

        let polling_interval_ms = with_shared(&self.shared, |inner| {
            inner.engine.attach_player(JsPlayer { inner: player });
            inner.markers.reset();
            inner.engine.config().polling_interval_ms
        })
        .ok_or_else(busy)?;

        self.listeners = Some(Listeners::install(&self.shared, polling_interval_ms)?);

        let navigated = with_shared(&self.shared, |inner| inner.engine.navigate_to_hash(true));
        if navigated == Some(true) {
            console_log("Applied initial location fragment");
        }
        notify(&self.shared);
        Ok(())
    }

    /// Stop polling and listening. Every command is a no-op afterwards.
    #[wasm_bindgen(js_name = "detachPlayer")]
    pub fn detach_player(&mut self) {
        self.listeners = None;
        let detached = with_shared(&self.shared, |inner| {
            inner.engine.detach_player();
            inner.markers.reset();
        });
        if detached.is_some() {
            notify(&self.shared);
        }
    }

    /// Release the timer and listeners. Also happens when the object is freed.
    pub fn destroy(&mut self) {
        self.detach_player();
        with_shared(&self.shared, |inner| inner.on_change = None);
    }

    /// Replace the annotation document. No state carries over.
    #[wasm_bindgen(js_name = "loadDocument")]
    pub fn load_document(&mut self, markdown: &str) -> std::result::Result<(), JsValue> {
        let file = parse_annotations(markdown);
        with_shared(&self.shared, |inner| {
            inner.engine.load_document(&file);
            inner.file = file;
            inner.engine.navigate_to_hash(true);
        })
        .ok_or_else(busy)?;
        notify(&self.shared);
        Ok(())
    }

    /// Navigate to the annotation with `id`. `source` is one of `keyboard`,
    /// `hash`, `playback`, `toc`, `marker` or `progressBar`.
    #[wasm_bindgen(js_name = "navigateTo")]
    pub fn navigate_to(
        &mut self,
        id: &str,
        source: &str,
        should_pause: Option<bool>,
    ) -> std::result::Result<(), JsValue> {
        let source: NavigationSource = source.parse()?;
        let found = with_shared(&self.shared, |inner| {
            inner
                .engine
                .navigate_to_id(id, source, should_pause.unwrap_or(false))
        })
        .ok_or_else(busy)?;
        if !found {
            return Err(RehearseurError::UnknownAnnotation(id.to_string()).into());
        }
        notify(&self.shared);
        Ok(())
    }

    /// Progress-bar scrub to `time_ms`
    #[wasm_bindgen(js_name = "seekTo")]
    pub fn seek_to(&mut self, time_ms: f64) {
        if with_shared(&self.shared, |inner| inner.engine.seek_to(clamp_ms(time_ms))).is_some() {
            notify(&self.shared);
        }
    }

    #[wasm_bindgen(js_name = "dismissOverlay")]
    pub fn dismiss_overlay(&mut self) {
        if with_shared(&self.shared, |inner| inner.engine.dismiss_overlay()).is_some() {
            notify(&self.shared);
        }
    }

    pub fn play(&mut self) {
        if with_shared(&self.shared, |inner| inner.engine.play()).is_some() {
            notify(&self.shared);
        }
    }

    pub fn pause(&mut self) {
        if with_shared(&self.shared, |inner| inner.engine.pause()).is_some() {
            notify(&self.shared);
        }
    }

    #[wasm_bindgen(js_name = "togglePlayPause")]
    pub fn toggle_play_pause(&mut self) {
        if with_shared(&self.shared, |inner| inner.engine.toggle_play_pause()).is_some() {
            notify(&self.shared);
        }
    }

    /// Dispatch a key by its `KeyboardEvent.key` value, for hosts that route
    /// keys themselves. Returns whether the key was handled.
    #[wasm_bindgen(js_name = "handleKey")]
    pub fn handle_key(&mut self, key: &str) -> bool {
        let handled = with_shared(&self.shared, |inner| inner.engine.handle_key(key)).unwrap_or(false);
        if handled {
            notify(&self.shared);
        }
        handled
    }

    /// Current navigation state
    pub fn state(&self) -> std::result::Result<JsValue, JsValue> {
        let state = with_shared(&self.shared, |inner| inner.engine.state()).ok_or_else(busy)?;
        Ok(serde_wasm_bindgen::to_value(&state)?)
    }

    /// The parsed document
    #[wasm_bindgen(js_name = "annotationFile")]
    pub fn annotation_file(&self) -> std::result::Result<JsValue, JsValue> {
        let value = with_shared(&self.shared, |inner| serde_wasm_bindgen::to_value(&inner.file))
            .ok_or_else(busy)?;
        Ok(value?)
    }

    /// Table of contents at the current playback position
    pub fn toc(&self) -> std::result::Result<JsValue, JsValue> {
        let toc = with_shared(&self.shared, |inner| {
            build_toc(
                &inner.file,
                inner.engine.current_time(),
                &inner.engine.config().default_color,
            )
        })
        .ok_or_else(busy)?;
        Ok(serde_wasm_bindgen::to_value(&toc)?)
    }

    /// Measure the player's progress bar. Returns whether usable bounds were
    /// found; a hidden bar measures zero wide and is ignored.
    #[wasm_bindgen(js_name = "measureProgressBar")]
    pub fn measure_progress_bar(&mut self, selector: Option<String>) -> std::result::Result<bool, JsValue> {
        let selector = selector.as_deref().unwrap_or(PROGRESS_BAR_SELECTOR);
        let document = browser_window()?
            .document()
            .ok_or_else(|| RehearseurError::Browser("no document".to_string()))?;

        let Some(bar) = document.query_selector(selector)? else {
            return Ok(false);
        };
        let rect = bar.get_bounding_client_rect();
        let bounds = ProgressBarBounds::from_rect(rect.left(), rect.top(), rect.width(), rect.height());

        Ok(with_shared(&self.shared, |inner| inner.markers.measure(bounds)).ok_or_else(busy)?)
    }

    /// Whether the host should keep calling `measureProgressBar`
    #[wasm_bindgen(js_name = "needsMeasurement")]
    pub fn needs_measurement(&self, controls_visible: bool) -> bool {
        with_shared(&self.shared, |inner| inner.markers.needs_measurement(controls_visible)).unwrap_or(false)
    }

    /// Marker layout for the progress bar, or `null` when markers are hidden
    pub fn markers(&self, total_duration_ms: f64, controls_visible: bool) -> std::result::Result<JsValue, JsValue> {
        let layout = with_shared(&self.shared, |inner| {
            inner.markers.layout(
                &inner.file.annotations,
                clamp_ms(total_duration_ms),
                controls_visible,
                &inner.engine.config().default_color,
            )
        })
        .ok_or_else(busy)?;
        match layout {
            Some(layout) => Ok(serde_wasm_bindgen::to_value(&layout)?),
            None => Ok(JsValue::NULL),
        }
    }

    /// Register a callback receiving the state after every change, or clear
    /// it with `undefined`.
    #[wasm_bindgen(js_name = "setOnChange")]
    pub fn set_on_change(&mut self, callback: Option<js_sys::Function>) -> std::result::Result<(), JsValue> {
        with_shared(&self.shared, |inner| {
            inner.on_change = callback;
            inner.last_state = None;
        })
        .ok_or_else(busy)?;
        Ok(())
    }
}
