//! Taskbar widget window
//!
//! Owns the icon window (state kept in a `RefCell` in `GWLP_USERDATA`,
//! reclaimed on `WM_DESTROY`) and the transient tooltip window. Window messages are fed
//! to the [`InteractionMachine`] and the commands it returns are executed
//! here, on the UI thread.

use std::cell::RefCell;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender};
use windows::core::PCWSTR;
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{TrackMouseEvent, TME_LEAVE, TRACKMOUSEEVENT};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW,
    GetWindowLongPtrW, PostMessageW, PostQuitMessage, SetWindowLongPtrW, ShowWindow,
    TranslateMessage, GWLP_USERDATA, HMENU, MA_NOACTIVATE, MSG, SW_SHOWNOACTIVATE, WM_DESTROY,
    WM_DPICHANGED, WM_MOUSEACTIVATE, WM_MOUSEMOVE, WM_SETTINGCHANGE, WM_THEMECHANGED, WM_TIMER,
    WS_EX_LAYERED, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_EX_TRANSPARENT, WS_POPUP,
};

use super::gdi_text::GdiTextRasterizer;
use super::injection::{InjectionConfig, InjectionHelper};
use super::layered::LayeredPresenter;
use super::timers::Win32Timers;
use super::tray::window_rect;
use super::{register_class, wide, with_userdata, WM_APP_MENU_UPDATED};
use crate::compositor::{present_or_log, Origin};
use crate::config::OverlayConfig;
use crate::error::{OverlayError, Result};
use crate::fetch::{MenuFetchService, Subscription};
use crate::interaction::{Command, InteractionMachine, TimerKind};
use crate::logging::Diagnostics;
use crate::menu::DailyMenu;
use crate::render::surface::Rect;
use crate::render::{IconRenderer, TooltipFrame, TooltipRenderer};
use crate::theme;

const TOOLTIP_CLASS: &str = "Menu500TrackerTooltip";

// Not exported by windows-rs without the Controls feature
const WM_MOUSELEAVE: u32 = 0x02A3;

/// Tooltip window plus the frame it shows. Dropping destroys the window.
struct TooltipSurface {
    hwnd: HWND,
    frame: TooltipFrame,
    shown: bool,
}

impl TooltipSurface {
    fn create(frame: TooltipFrame) -> Result<Self> {
        let class = wide(TOOLTIP_CLASS);
        let Rect { x, y, width, height } = frame.rect;
        let hwnd = unsafe {
            let hinstance = GetModuleHandleW(None).map_err(|e| OverlayError::WindowCreation(e.to_string()))?;
            CreateWindowExW(
                WS_EX_LAYERED | WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE | WS_EX_TRANSPARENT,
                PCWSTR(class.as_ptr()),
                PCWSTR::null(),
                WS_POPUP,
                x,
                y,
                width,
                height,
                HWND::default(),
                HMENU::default(),
                hinstance,
                None,
            )
        };
        if hwnd == HWND::default() {
            return Err(OverlayError::WindowCreation("tooltip window".to_string()));
        }
        Ok(Self {
            hwnd,
            frame,
            shown: false,
        })
    }
}

impl Drop for TooltipSurface {
    fn drop(&mut self) {
        unsafe {
            let _ = DestroyWindow(self.hwnd);
        }
    }
}

/// Everything the window procedure needs, stored in GWLP_USERDATA
struct WidgetState {
    hwnd: HWND,
    helper: InjectionHelper,
    machine: InteractionMachine<Win32Timers>,
    icon: IconRenderer<GdiTextRasterizer>,
    tooltip: TooltipRenderer<GdiTextRasterizer>,
    tooltip_surface: Option<TooltipSurface>,
    menu_rx: Receiver<DailyMenu>,
    diagnostics: Diagnostics,
}

impl WidgetState {
    fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::TrackLeave => self.track_leave(),
                Command::RepaintIcon { hover } => self.repaint_icon(hover),
                Command::RenderTooltip => self.render_tooltip(),
                Command::PresentTooltip { alpha } => self.present_tooltip(alpha),
                Command::HideTooltip => self.tooltip_surface = None,
            }
        }
    }

    fn track_leave(&self) {
        let mut tme = TRACKMOUSEEVENT {
            cbSize: std::mem::size_of::<TRACKMOUSEEVENT>() as u32,
            dwFlags: TME_LEAVE,
            hwndTrack: self.hwnd,
            dwHoverTime: 0,
        };
        unsafe {
            let _ = TrackMouseEvent(&mut tme);
        }
    }

    fn repaint_icon(&self, hover: bool) {
        let mut presenter = LayeredPresenter::new(self.hwnd);
        self.icon.render(hover, theme::is_dark_mode(), &mut presenter);
    }

    fn render_tooltip(&mut self) {
        // Old window and buffer go before the replacement is built
        self.tooltip_surface = None;

        let Some(anchor) = window_rect(self.hwnd) else {
            self.diagnostics.emit("Tooltip skipped: icon bounds unavailable");
            return;
        };
        let frame = match self.tooltip.render(self.machine.content(), theme::is_dark_mode(), anchor) {
            Ok(Some(frame)) => frame,
            Ok(None) => return,
            Err(e) => {
                self.diagnostics.emit(&format!("Tooltip render failed: {}", e));
                return;
            }
        };

        match TooltipSurface::create(frame) {
            Ok(surface) => self.tooltip_surface = Some(surface),
            Err(e) => self.diagnostics.emit(&format!("Tooltip surface failed: {}", e)),
        }
    }

    fn present_tooltip(&mut self, alpha: u8) {
        let Some(surface) = self.tooltip_surface.as_mut() else {
            return;
        };
        let origin = Origin {
            x: surface.frame.rect.x,
            y: surface.frame.rect.y,
        };
        let mut presenter = LayeredPresenter::new(surface.hwnd);
        let presented = present_or_log(&mut presenter, &surface.frame.buffer, Some(origin), alpha, &self.diagnostics);
        if presented && !surface.shown {
            unsafe {
                ShowWindow(surface.hwnd, SW_SHOWNOACTIVATE);
            }
            surface.shown = true;
        }
    }

    /// Apply the newest queued menu; older ones are superseded
    fn drain_menus(&mut self) -> Vec<Command> {
        let Some(menu) = self.menu_rx.try_iter().last() else {
            return Vec::new();
        };
        tracing::debug!(is_error = menu.is_error, "Menu delivered to widget");
        self.machine.content_updated(menu.tooltip_content())
    }

    fn dpi_changed(&mut self, dpi: u32) {
        let scale = if dpi == 0 { 1.0 } else { dpi as f32 / 96.0 };
        if let Err(e) = self.helper.rescale(scale) {
            self.diagnostics.emit(&format!("Re-injection after DPI change failed: {}", e));
        }
        if let Some(injected) = self.helper.injected() {
            self.icon.resize(injected.width, injected.height, scale);
        }
        self.tooltip.set_dpi_scale(scale);

        // Same redraw a theme change needs
        let commands = self.machine.theme_changed();
        self.execute(commands);
    }
}

unsafe fn with_state<T>(hwnd: HWND, f: impl FnOnce(&mut WidgetState) -> T) -> Option<T> {
    with_userdata::<WidgetState, T>(hwnd, f)
}

unsafe extern "system" fn wndproc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    let handled = match msg {
        WM_MOUSEMOVE => with_state(hwnd, |state| {
            let commands = state.machine.pointer_move();
            state.execute(commands);
        }),
        WM_MOUSELEAVE => with_state(hwnd, |state| {
            let commands = state.machine.pointer_leave();
            state.execute(commands);
        }),
        WM_TIMER => with_state(hwnd, |state| {
            if let Some(kind) = TimerKind::from_id(wparam.0) {
                let commands = state.machine.timer_fired(kind);
                state.execute(commands);
            }
        }),
        WM_SETTINGCHANGE | WM_THEMECHANGED => {
            with_state(hwnd, |state| {
                let commands = state.machine.theme_changed();
                state.execute(commands);
            });
            None
        }
        WM_APP_MENU_UPDATED => with_state(hwnd, |state| {
            let commands = state.drain_menus();
            state.execute(commands);
        }),
        WM_DPICHANGED => with_state(hwnd, |state| state.dpi_changed((wparam.0 & 0xFFFF) as u32)),
        WM_MOUSEACTIVATE => return LRESULT(MA_NOACTIVATE as isize),
        WM_DESTROY => {
            let shut_down = with_state(hwnd, |state| {
                let commands = state.machine.shutdown();
                state.execute(commands);
                state.tooltip_surface = None;
                // Already being destroyed; the helper must not destroy it again
                state.helper.release();
            });

            // Reclaimed only once no borrow is live
            if shut_down.is_some() {
                let ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA);
                SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
                drop(Box::from_raw(ptr as *mut RefCell<WidgetState>));
            } else {
                tracing::warn!("Widget destroyed while its state was in use");
            }
            PostQuitMessage(0);
            return LRESULT(0);
        }
        _ => None,
    };

    match handled {
        Some(()) => LRESULT(0),
        None => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

unsafe extern "system" fn tooltip_wndproc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    DefWindowProcW(hwnd, msg, wparam, lparam)
}

/// The taskbar "500" icon and its menu tooltip
pub struct OverlayWidget {
    config: OverlayConfig,
    service: Arc<MenuFetchService>,
    subscription: Option<Subscription>,
    target: Arc<AtomicIsize>,
    menu_rx: Receiver<DailyMenu>,
    hwnd: Option<HWND>,
}

impl OverlayWidget {
    /// Subscribe to `service`. Nothing is shown until [`initialize`](Self::initialize).
    pub fn new(config: OverlayConfig, service: Arc<MenuFetchService>) -> Self {
        let (menu_tx, menu_rx): (Sender<DailyMenu>, Receiver<DailyMenu>) = channel::unbounded();
        // Raw handle of the icon window, 0 until it exists
        let target = Arc::new(AtomicIsize::new(0));

        let post_to = target.clone();
        let subscription = service.subscribe(move |menu| {
            if menu_tx.send(menu.clone()).is_err() {
                return;
            }
            let hwnd = post_to.load(Ordering::SeqCst);
            if hwnd != 0 {
                unsafe {
                    let _ = PostMessageW(HWND(hwnd), WM_APP_MENU_UPDATED, WPARAM(0), LPARAM(0));
                }
            }
        });

        Self {
            config,
            service,
            subscription: Some(subscription),
            target,
            menu_rx,
            hwnd: None,
        }
    }

    pub fn hwnd(&self) -> Option<HWND> {
        self.hwnd
    }

    /// Create, inject, paint and show the icon window
    pub fn initialize(&mut self) -> Result<()> {
        if self.hwnd.is_some() {
            return Ok(());
        }

        let mut helper = InjectionHelper::new(InjectionConfig::from_config(&self.config));
        let injected = helper.initialize(Some(wndproc))?;
        register_class(TOOLTIP_CLASS, Some(tooltip_wndproc))?;

        let diagnostics = Diagnostics::tracing();
        let mut state = WidgetState {
            hwnd: injected.window,
            helper,
            machine: InteractionMachine::new(self.config.interaction(), Win32Timers::new(injected.window)),
            icon: IconRenderer::new(
                GdiTextRasterizer,
                self.config.glyph.clone(),
                injected.width,
                injected.height,
                injected.dpi_scale,
                diagnostics.clone(),
            ),
            tooltip: TooltipRenderer::new(GdiTextRasterizer, injected.dpi_scale),
            tooltip_surface: None,
            menu_rx: self.menu_rx.clone(),
            diagnostics,
        };

        // Seed from a fetch that finished before the window existed
        if let Some(menu) = self.service.current_menu() {
            state.machine.content_updated(menu.tooltip_content());
        }

        let hwnd = injected.window;
        unsafe {
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, Box::into_raw(Box::new(RefCell::new(state))) as isize);
        }
        self.hwnd = Some(hwnd);
        self.target.store(hwnd.0, Ordering::SeqCst);

        let injected_slot = unsafe { with_state(hwnd, |state| state.helper.inject()) }
            .ok_or_else(|| OverlayError::WindowCreation("widget state missing".to_string()))?;
        if let Err(e) = injected_slot {
            tracing::error!("Injection failed: {}", e);
            self.dispose();
            return Err(e);
        }

        let placed = unsafe {
            with_state(hwnd, |state| {
                let placed = state.helper.injected().copied();
                let (width, height) = placed.map(|i| (i.width, i.height)).unwrap_or(state.icon.size());
                state.icon.resize(width, height, injected.dpi_scale);
                state.repaint_icon(false);
                placed
            })
        }
        .flatten();

        // Showing sends messages back into wndproc; no borrow may be live
        if let Some(placed) = placed {
            placed.show();
        }

        unsafe {
            with_state(hwnd, |state| {
                let commands = state.drain_menus();
                state.execute(commands);
            });
        }

        tracing::info!("Widget initialized");
        Ok(())
    }

    /// Unsubscribe and destroy the windows. Safe to call more than once.
    pub fn dispose(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.service.unsubscribe(subscription);
        }
        self.target.store(0, Ordering::SeqCst);
        if let Some(hwnd) = self.hwnd.take() {
            unsafe {
                let _ = DestroyWindow(hwnd);
            }
        }
    }
}

impl Drop for OverlayWidget {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Pump messages until `WM_QUIT`
pub fn run_message_loop() {
    let mut msg = MSG::default();
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).0 > 0 {
            TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}
