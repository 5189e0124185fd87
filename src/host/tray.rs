//! Taskbar discovery and child enumeration

use windows::core::PCWSTR;
use windows::Win32::Foundation::{BOOL, HWND, LPARAM, RECT, TRUE};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumChildWindows, FindWindowW, GetAncestor, GetClassNameW, GetWindowRect, IsWindowVisible,
    GA_PARENT,
};

use super::{rect_from_win32, wide};
use crate::render::surface::Rect;
use crate::slot::ChildSpan;

const TASKBAR_CLASS: &str = "Shell_TrayWnd";
const NOTIFY_AREA_CLASS: &str = "TrayNotifyWnd";

/// Primary taskbar window, if the shell is running
pub fn find_taskbar() -> Option<HWND> {
    let class = wide(TASKBAR_CLASS);
    let hwnd = unsafe { FindWindowW(PCWSTR(class.as_ptr()), PCWSTR::null()) };
    (hwnd.0 != 0).then_some(hwnd)
}

pub fn window_rect(hwnd: HWND) -> Option<Rect> {
    let mut rect = RECT::default();
    unsafe { GetWindowRect(hwnd, &mut rect) }.ok()?;
    Some(rect_from_win32(rect))
}

fn class_name(hwnd: HWND) -> String {
    let mut buf = [0u16; 64];
    let len = unsafe { GetClassNameW(hwnd, &mut buf) };
    String::from_utf16_lossy(&buf[..len.max(0) as usize])
}

/// Taskbar children relative to the taskbar origin. The notification area
/// is kept apart: it bounds the search instead of taking part in it.
#[derive(Debug, Clone, Default)]
pub struct TaskbarChildren {
    pub spans: Vec<ChildSpan>,
    pub notify_left: Option<i32>,
}

struct Enumeration {
    parent: HWND,
    exclude: HWND,
    rects: Vec<Rect>,
    notify: Option<Rect>,
}

unsafe extern "system" fn collect_child(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let enumeration = &mut *(lparam.0 as *mut Enumeration);

    // EnumChildWindows walks all descendants; only direct children occupy the bar
    if hwnd == enumeration.exclude || GetAncestor(hwnd, GA_PARENT) != enumeration.parent {
        return TRUE;
    }
    if !IsWindowVisible(hwnd).as_bool() {
        return TRUE;
    }
    if let Some(rect) = window_rect(hwnd) {
        if class_name(hwnd) == NOTIFY_AREA_CLASS {
            enumeration.notify = Some(rect);
        } else if !rect.is_empty() {
            enumeration.rects.push(rect);
        }
    }
    TRUE
}

/// Visible direct children of `taskbar`. `exclude` is the window being placed.
pub fn child_spans(taskbar: HWND, exclude: HWND) -> TaskbarChildren {
    let Some(origin) = window_rect(taskbar) else {
        tracing::warn!("Could not read taskbar bounds");
        return TaskbarChildren::default();
    };

    let mut enumeration = Enumeration {
        parent: taskbar,
        exclude,
        rects: Vec::new(),
        notify: None,
    };
    unsafe {
        let _ = EnumChildWindows(
            taskbar,
            Some(collect_child),
            LPARAM(&mut enumeration as *mut Enumeration as isize),
        );
    }

    tracing::debug!(
        notify_area = enumeration.notify.is_some(),
        "Taskbar has {} visible children",
        enumeration.rects.len()
    );
    TaskbarChildren {
        spans: enumeration
            .rects
            .into_iter()
            .map(|r| ChildSpan::from_rect(Rect::new(r.x - origin.x, r.y - origin.y, r.width, r.height)))
            .collect(),
        notify_left: enumeration.notify.map(|r| r.x - origin.x),
    }
}
