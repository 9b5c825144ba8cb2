//! Screen enumeration using winit

use parking_lot::RwLock;
use winit::{dpi::PhysicalSize, event_loop::EventLoopWindowTarget, monitor::MonitorHandle};

use crate::backend::{ScreenInfo, Windowing};

/// Monitors as seen by winit, primary monitor first.
///
/// winit only hands out monitors through a live event loop, so the list is a
/// copy taken from one; call [`refresh`](Self::refresh) after a display change.
#[derive(Debug, Default)]
pub struct WinitScreens {
    screens: RwLock<Vec<ScreenInfo>>,
}

impl WinitScreens {
    /// Snapshot the monitors of an event loop (an `&EventLoop` derefs to the target)
    pub fn from_target<T>(target: &EventLoopWindowTarget<T>) -> Self {
        let screens = Self::default();
        screens.refresh(target);
        screens
    }

    /// Re-read the monitor list
    pub fn refresh<T>(&self, target: &EventLoopWindowTarget<T>) {
        let primary = target.primary_monitor();
        let mut monitors: Vec<MonitorHandle> = Vec::new();
        if let Some(primary) = &primary {
            monitors.push(primary.clone());
        }
        monitors.extend(
            target
                .available_monitors()
                .filter(|monitor| Some(monitor) != primary.as_ref()),
        );

        let screens: Vec<ScreenInfo> = monitors.iter().map(monitor_info).collect();
        log::debug!("Found {} screen(s)", screens.len());
        *self.screens.write() = screens;
    }
}

impl Windowing for WinitScreens {
    fn screen_count(&self) -> Option<usize> {
        Some(self.screens.read().len())
    }

    fn screen(&self, index: usize) -> Option<ScreenInfo> {
        self.screens.read().get(index).copied()
    }
}

fn monitor_info(monitor: &MonitorHandle) -> ScreenInfo {
    screen_info(
        monitor.size(),
        monitor.refresh_rate_millihertz(),
        monitor.video_modes().map(|mode| mode.bit_depth()),
    )
}

fn screen_info(
    size: PhysicalSize<u32>,
    refresh_millihertz: Option<u32>,
    bit_depths: impl Iterator<Item = u16>,
) -> ScreenInfo {
    ScreenInfo {
        width: size.width,
        height: size.height,
        refresh_rate: refresh_millihertz.map_or(0.0, |mhz| mhz as f32 / 1000.0),
        color_depth: bit_depths.map(u32::from).max().unwrap_or(0),
    }
}
