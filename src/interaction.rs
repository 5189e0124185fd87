//! Hover tracking and tooltip fade state machine
//!
//! The machine is host-agnostic: input and timer events go in, a list of
//! [`Command`]s comes out, and the host window procedure executes them.
//! Timers are owned through [`Timers`], which knows which kinds are pending
//! and always cancels before re-arming.

use std::time::Duration;

use crate::render::tooltip::TooltipContent;

/// Logical timers used by the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// One-shot hover delay before the tooltip appears
    ShowDelay,
    /// Repeating opacity animation step
    FadeTick,
}

impl TimerKind {
    pub const ALL: [TimerKind; 2] = [TimerKind::ShowDelay, TimerKind::FadeTick];

    /// Host timer identifier
    pub const fn id(self) -> usize {
        match self {
            TimerKind::ShowDelay => 1,
            TimerKind::FadeTick => 2,
        }
    }

    pub fn from_id(id: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.id() == id)
    }

    fn slot(self) -> usize {
        self.id() - 1
    }
}

/// Host side of the timers (SetTimer/KillTimer on Windows)
pub trait TimerBackend {
    fn start(&mut self, kind: TimerKind, interval: Duration);
    fn stop(&mut self, kind: TimerKind);
}

/// Pending-timer registry in front of a backend
#[derive(Debug)]
pub struct Timers<B: TimerBackend> {
    backend: B,
    pending: [bool; 2],
}

impl<B: TimerBackend> Timers<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            pending: [false; 2],
        }
    }

    /// Start `kind`, replacing a pending timer of the same kind
    pub fn arm(&mut self, kind: TimerKind, interval: Duration) {
        if self.pending[kind.slot()] {
            self.backend.stop(kind);
        }
        self.backend.start(kind, interval);
        self.pending[kind.slot()] = true;
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        if self.pending[kind.slot()] {
            self.backend.stop(kind);
            self.pending[kind.slot()] = false;
        }
    }

    pub fn cancel_all(&mut self) {
        for kind in TimerKind::ALL {
            self.cancel(kind);
        }
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.pending[kind.slot()]
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionSettings {
    pub show_delay: Duration,
    pub fade_tick: Duration,
    /// Alpha gained per tick while appearing
    pub fade_in_step: u8,
    /// Alpha lost per tick while disappearing
    pub fade_out_step: u8,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        InteractionSettings {
            show_delay: Duration::from_millis(400),
            fade_tick: Duration::from_millis(16),
            fade_in_step: 24,
            fade_out_step: 48,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Hovering,
    TooltipArmed,
    TooltipVisible,
    TooltipFadingOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HoverState {
    pub over_icon: bool,
    pub leave_tracking_armed: bool,
}

/// Tooltip opacity animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fade {
    current: u8,
    target: u8,
}

impl Fade {
    pub fn current(&self) -> u8 {
        self.current
    }

    pub fn target(&self) -> u8 {
        self.target
    }

    pub fn visible(&self) -> bool {
        self.current > 0 || self.target > 0
    }

    pub fn settled(&self) -> bool {
        self.current == self.target
    }

    /// Move toward the target without overshooting
    pub fn step(&mut self, in_step: u8, out_step: u8) -> u8 {
        if self.current < self.target {
            self.current = self.current.saturating_add(in_step).min(self.target);
        } else if self.current > self.target {
            self.current = self.current.saturating_sub(out_step).max(self.target);
        }
        self.current
    }
}

/// Work the host must carry out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Ask the host for a one-shot pointer-leave notification
    TrackLeave,
    RepaintIcon { hover: bool },
    /// Rebuild the tooltip surface from the current content
    RenderTooltip,
    /// Composite the tooltip surface at this alpha
    PresentTooltip { alpha: u8 },
    /// Hide the tooltip and release its surface
    HideTooltip,
}

pub struct InteractionMachine<B: TimerBackend> {
    settings: InteractionSettings,
    timers: Timers<B>,
    phase: Phase,
    hover: HoverState,
    fade: Fade,
    content: TooltipContent,
}

impl<B: TimerBackend> InteractionMachine<B> {
    pub fn new(settings: InteractionSettings, backend: B) -> Self {
        Self {
            settings,
            timers: Timers::new(backend),
            phase: Phase::Idle,
            hover: HoverState::default(),
            fade: Fade::default(),
            content: TooltipContent::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn hover(&self) -> HoverState {
        self.hover
    }

    pub fn fade(&self) -> Fade {
        self.fade
    }

    pub fn content(&self) -> &TooltipContent {
        &self.content
    }

    pub fn timers(&self) -> &Timers<B> {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut Timers<B> {
        &mut self.timers
    }

    pub fn pointer_move(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();

        // The host drops leave tracking after every leave notification
        if !self.hover.leave_tracking_armed {
            self.hover.leave_tracking_armed = true;
            commands.push(Command::TrackLeave);
        }
        if self.hover.over_icon {
            return commands;
        }

        self.hover.over_icon = true;
        commands.push(Command::RepaintIcon { hover: true });

        if self.fade.visible() {
            // Back over the icon mid fade-out: turn around from the current alpha
            self.fade.target = 255;
            if !self.fade.settled() {
                self.timers.arm(TimerKind::FadeTick, self.settings.fade_tick);
            }
            self.phase = Phase::TooltipVisible;
        } else {
            self.timers.arm(TimerKind::ShowDelay, self.settings.show_delay);
            self.phase = Phase::Hovering;
        }
        commands
    }

    pub fn pointer_leave(&mut self) -> Vec<Command> {
        self.hover.leave_tracking_armed = false;
        if !self.hover.over_icon {
            return Vec::new();
        }

        self.hover.over_icon = false;
        self.timers.cancel(TimerKind::ShowDelay);

        if self.fade.visible() {
            self.begin_fade_out();
        } else {
            self.phase = Phase::Idle;
        }
        vec![Command::RepaintIcon { hover: false }]
    }

    pub fn timer_fired(&mut self, kind: TimerKind) -> Vec<Command> {
        // A tick may already be queued when its timer is cancelled
        if !self.timers.is_pending(kind) {
            return Vec::new();
        }
        match kind {
            TimerKind::ShowDelay => self.show_delay_elapsed(),
            TimerKind::FadeTick => self.fade_tick(),
        }
    }

    /// Replace the tooltip content snapshot
    pub fn content_updated(&mut self, content: TooltipContent) -> Vec<Command> {
        self.content = content;
        if !self.fade.visible() {
            // The delay already lapsed on empty content while still hovering
            if self.phase == Phase::Hovering
                && self.hover.over_icon
                && !self.content.is_empty()
                && !self.timers.is_pending(TimerKind::ShowDelay)
            {
                self.timers.arm(TimerKind::ShowDelay, self.settings.show_delay);
            }
            return Vec::new();
        }
        if self.content.is_empty() {
            self.begin_fade_out();
            return Vec::new();
        }
        vec![
            Command::RenderTooltip,
            Command::PresentTooltip { alpha: self.fade.current },
        ]
    }

    pub fn theme_changed(&mut self) -> Vec<Command> {
        let mut commands = vec![Command::RepaintIcon { hover: self.hover.over_icon }];
        if self.fade.visible() && !self.content.is_empty() {
            commands.push(Command::RenderTooltip);
            commands.push(Command::PresentTooltip { alpha: self.fade.current });
        }
        commands
    }

    /// Stop all timers and drop the tooltip. Safe to call repeatedly.
    pub fn shutdown(&mut self) -> Vec<Command> {
        self.timers.cancel_all();
        let was_visible = self.fade.visible();
        self.fade = Fade::default();
        self.hover = HoverState::default();
        self.phase = Phase::Idle;
        if was_visible {
            vec![Command::HideTooltip]
        } else {
            Vec::new()
        }
    }

    fn show_delay_elapsed(&mut self) -> Vec<Command> {
        self.timers.cancel(TimerKind::ShowDelay);
        if !self.hover.over_icon || self.content.is_empty() {
            return Vec::new();
        }

        self.phase = Phase::TooltipArmed;
        self.fade.target = 255;
        self.timers.arm(TimerKind::FadeTick, self.settings.fade_tick);
        self.phase = Phase::TooltipVisible;
        vec![
            Command::RenderTooltip,
            Command::PresentTooltip { alpha: self.fade.current },
        ]
    }

    fn fade_tick(&mut self) -> Vec<Command> {
        let before = self.fade.current;
        let alpha = self.fade.step(self.settings.fade_in_step, self.settings.fade_out_step);

        if !self.fade.settled() {
            return vec![Command::PresentTooltip { alpha }];
        }

        self.timers.cancel(TimerKind::FadeTick);
        if self.fade.target == 0 {
            self.phase = if self.hover.over_icon { Phase::Hovering } else { Phase::Idle };
            vec![Command::HideTooltip]
        } else {
            self.phase = Phase::TooltipVisible;
            if alpha != before {
                vec![Command::PresentTooltip { alpha }]
            } else {
                Vec::new()
            }
        }
    }

    fn begin_fade_out(&mut self) {
        self.fade.target = 0;
        self.timers.arm(TimerKind::FadeTick, self.settings.fade_tick);
        self.phase = Phase::TooltipFadingOut;
    }
}
