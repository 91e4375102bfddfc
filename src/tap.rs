//! Physical key tap: global key-press capture via evdev with automatic device reconnection.

use crate::keymap::Key;
use evdev::Device;
use std::io;
use std::os::unix::io::AsRawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where physical key presses come from while a tap is installed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapMode {
    /// Every keyboard on the system, via /dev/input
    Global,
    /// Only keys the host terminal delivers to the focused window
    Local,
}

/// An installed key tap. Dropping it stops and joins the reader threads.
pub struct Subscription {
    mode: TapMode,
    running: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(mode: TapMode, running: Arc<AtomicBool>, workers: Vec<JoinHandle<()>>) -> Self {
        Self { mode, running, workers }
    }

    /// Subscription without reader threads
    pub fn local() -> Self {
        Self::new(TapMode::Local, Arc::new(AtomicBool::new(true)), Vec::new())
    }

    pub fn mode(&self) -> TapMode {
        self.mode
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        info!(mode = ?self.mode, "physical key tap released");
    }
}

/// Something that can deliver physical key presses into a channel
pub trait KeySource {
    fn open(&self, sink: Sender<Key>) -> io::Result<Subscription>;
}

/// Reads every keyboard under /dev/input, one thread per device
pub struct EvdevSource;

impl KeySource for EvdevSource {
    fn open(&self, sink: Sender<Key>) -> io::Result<Subscription> {
        let keyboards = find_keyboard_devices();
        if keyboards.is_empty() {
            info!("no readable keyboard devices, falling back to terminal input");
            return Ok(Subscription::local());
        }

        let subscription = spawn_readers(keyboards, |device, running| {
            let sink = sink.clone();
            let name = device.name().unwrap_or("unnamed").to_string();
            debug!(device = %name, "spawning key reader");

            std::thread::Builder::new()
                .name(format!("key-tap:{}", name))
                .spawn(move || {
                    let mut reader = ReconnectingDevice::new(device);

                    while running.load(Ordering::Relaxed) {
                        reader.poll_events(|ev| {
                            if let Some(key) = pressed_key(ev) {
                                if sink.send(key).is_err() {
                                    running.store(false, Ordering::Relaxed);
                                }
                            }
                        });
                        std::thread::sleep(Duration::from_millis(10));
                    }
                })
        })?;

        info!(devices = subscription.workers.len(), "physical key tap installed");
        Ok(subscription)
    }
}

/// Start one worker per item. If a spawn fails, the workers already running
/// are stopped and joined before the error is returned.
fn spawn_readers<T, F>(items: Vec<T>, mut spawn: F) -> io::Result<Subscription>
where
    F: FnMut(T, Arc<AtomicBool>) -> io::Result<JoinHandle<()>>,
{
    let mut subscription =
        Subscription::new(TapMode::Global, Arc::new(AtomicBool::new(true)), Vec::new());
    for item in items {
        let handle = spawn(item, Arc::clone(&subscription.running))?;
        subscription.workers.push(handle);
    }
    Ok(subscription)
}

/// Logical key for a key-down event. Autorepeat (value 2) counts as a
/// press, like a held key in the terminal; releases (value 0) do not.
pub fn pressed_key(event: &evdev::InputEvent) -> Option<Key> {
    match event.kind() {
        evdev::InputEventKind::Key(key) if event.value() != 0 => Key::from_evdev(key),
        _ => None,
    }
}

/// Never opens devices; presses only arrive through the terminal
pub struct NullSource;

impl KeySource for NullSource {
    fn open(&self, _sink: Sender<Key>) -> io::Result<Subscription> {
        Ok(Subscription::local())
    }
}

/// Sets a device to non-blocking mode.
pub fn set_nonblocking(device: &Device) {
    let fd = device.as_raw_fd();
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
    }
}

/// Finds all keyboard devices.
pub fn find_keyboard_devices() -> Vec<Device> {
    let mut keyboards = Vec::new();
    let entries = match std::fs::read_dir("/dev/input") {
        Ok(entries) => entries,
        Err(e) => {
            warn!("cannot read /dev/input: {}", e);
            return keyboards;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let is_event_node = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("event"));
        if !is_event_node {
            continue;
        }
        match Device::open(&path) {
            Ok(device) => {
                // Check if device has key events (is a keyboard)
                if device.supported_keys().is_some_and(|keys| {
                    keys.contains(evdev::Key::KEY_A) && keys.contains(evdev::Key::KEY_SPACE)
                }) {
                    keyboards.push(device);
                }
            }
            Err(e) => debug!("could not open {}: {}", path.display(), e),
        }
    }
    keyboards
}

/// Wrapper for evdev device with automatic reconnection support.
pub struct ReconnectingDevice {
    device: Device,
    physical_path: Option<String>,
    consecutive_errors: u32,
    needs_reconnect: bool,
}

impl ReconnectingDevice {
    /// Create a new reconnecting device wrapper.
    pub fn new(device: Device) -> Self {
        let physical_path = device.physical_path().map(|p| p.to_string());
        set_nonblocking(&device);
        Self {
            device,
            physical_path,
            consecutive_errors: 0,
            needs_reconnect: false,
        }
    }

    /// Fetch pending events, reconnecting first if the device went away.
    /// The callback is invoked for each event.
    pub fn poll_events<F>(&mut self, mut callback: F)
    where
        F: FnMut(&evdev::InputEvent),
    {
        if self.needs_reconnect {
            self.needs_reconnect = false;
            std::thread::sleep(Duration::from_secs(1));
            self.reconnect();
        }

        match self.device.fetch_events() {
            Ok(events) => {
                self.consecutive_errors = 0;
                for ev in events {
                    callback(&ev);
                }
            }
            Err(e) => {
                // EAGAIN/EWOULDBLOCK are normal for non-blocking reads
                if e.raw_os_error() != Some(libc::EAGAIN)
                    && e.raw_os_error() != Some(libc::EWOULDBLOCK)
                {
                    self.consecutive_errors += 1;
                    if self.consecutive_errors > 50 {
                        warn!("keyboard device keeps failing ({}), reconnecting", e);
                        self.needs_reconnect = true;
                    }
                }
            }
        }
    }

    fn reconnect(&mut self) {
        let candidates = find_keyboard_devices();
        let replacement = match self.physical_path {
            // Same physical port first
            Some(ref path) => candidates
                .into_iter()
                .find(|dev| dev.physical_path() == Some(path.as_str())),
            None => candidates.into_iter().next(),
        };

        if let Some(device) = replacement {
            set_nonblocking(&device);
            self.device = device;
            self.consecutive_errors = 0;
            info!("keyboard device reconnected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn null_source_is_local() {
        let (tx, _rx) = mpsc::channel();
        let sub = NullSource.open(tx).unwrap();
        assert_eq!(sub.mode(), TapMode::Local);
    }

    fn key_event(key: evdev::Key, value: i32) -> evdev::InputEvent {
        evdev::InputEvent::new(evdev::EventType::KEY, key.code(), value)
    }

    #[test]
    fn presses_and_repeats_are_forwarded() {
        assert_eq!(pressed_key(&key_event(evdev::Key::KEY_A, 1)), Some(Key::char('A')));
        assert_eq!(pressed_key(&key_event(evdev::Key::KEY_A, 2)), Some(Key::char('A')));
        assert_eq!(pressed_key(&key_event(evdev::Key::KEY_A, 0)), None);
        assert_eq!(pressed_key(&key_event(evdev::Key::KEY_VOLUMEUP, 1)), None);
        let sync = evdev::InputEvent::new(evdev::EventType::SYNCHRONIZATION, 0, 1);
        assert_eq!(pressed_key(&sync), None);
    }

    #[test]
    fn failed_spawn_stops_earlier_workers() {
        let seen: Arc<std::sync::Mutex<Option<Arc<AtomicBool>>>> = Default::default();
        let seen_clone = Arc::clone(&seen);
        let result = spawn_readers(vec![1, 2], move |item, running| {
            if item == 2 {
                return Err(io::Error::new(io::ErrorKind::Other, "no more threads"));
            }
            *seen_clone.lock().unwrap() = Some(Arc::clone(&running));
            Ok(std::thread::spawn(move || {
                while running.load(Ordering::Relaxed) {
                    std::thread::sleep(Duration::from_millis(1));
                }
            }))
        });
        assert!(result.is_err());
        let running = seen.lock().unwrap().take().unwrap();
        assert!(!running.load(Ordering::Relaxed));
    }

    #[test]
    fn spawned_readers_share_one_flag() {
        let subscription = spawn_readers(vec![(), ()], |_, running| {
            Ok(std::thread::spawn(move || {
                while running.load(Ordering::Relaxed) {
                    std::thread::sleep(Duration::from_millis(1));
                }
            }))
        })
        .unwrap();
        assert_eq!(subscription.mode(), TapMode::Global);
        assert_eq!(subscription.workers.len(), 2);
        let running = Arc::clone(&subscription.running);
        drop(subscription);
        assert!(!running.load(Ordering::Relaxed));
    }

    #[test]
    fn dropping_subscription_stops_workers() {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let worker = std::thread::spawn(move || {
            while flag.load(Ordering::Relaxed) {
                std::thread::sleep(Duration::from_millis(1));
            }
        });
        let sub = Subscription::new(TapMode::Global, Arc::clone(&running), vec![worker]);
        drop(sub);
        assert!(!running.load(Ordering::Relaxed));
    }
}
