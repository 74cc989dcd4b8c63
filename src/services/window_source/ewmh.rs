use crate::error::{Result, SwitcherError};
use crate::{switcher_error, trace_if_enabled};
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::properties::WmClass;
use x11rb::protocol::xproto::{AtomEnum, ConnectionExt as _, Window};
use x11rb::rust_connection::RustConnection;

use super::records::{decode_latin1, format_record, parse_window_id, UNKNOWN_FIELD};
use super::r#trait::WindowSource;
use super::x11::{activate_data, close_data, send_root_message};

/// _NET_WM_DESKTOP для окон, видимых на всех рабочих столах
const ALL_DESKTOPS: u32 = 0xFFFF_FFFF;

x11rb::atom_manager! {
    pub EwmhAtoms: EwmhAtomsCookie {
        WM_NAME,
        WM_CLIENT_MACHINE,
        UTF8_STRING,
        _NET_CLIENT_LIST_STACKING,
        _NET_ACTIVE_WINDOW,
        _NET_CLOSE_WINDOW,
        _NET_WM_NAME,
        _NET_WM_DESKTOP,
    }
}

/// EWMH через хелперы x11rb: UTF-8 заголовки и реальные номера рабочих столов.
pub struct EwmhSource {
    conn: RustConnection,
    root: Window,
    atoms: EwmhAtoms,
}

impl EwmhSource {
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None)?;
        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| screen.root)
            .ok_or_else(|| switcher_error!(backend_unavailable, "нет экрана {}", screen_num))?;
        let atoms = EwmhAtoms::new(&conn)?.reply()?;

        info!("EWMH: подключение к X11 установлено (экран {})", screen_num);
        Ok(Self { conn, root, atoms })
    }

    fn client_list_stacking(&self) -> Result<Vec<Window>> {
        let reply = self
            .conn
            .get_property(
                false,
                self.root,
                self.atoms._NET_CLIENT_LIST_STACKING,
                AtomEnum::WINDOW,
                0,
                u32::MAX,
            )?
            .reply()?;

        reply.value32().map(|ids| ids.collect()).ok_or_else(|| {
            SwitcherError::BackendUnavailable(
                "оконный менеджер не публикует _NET_CLIENT_LIST_STACKING".to_string(),
            )
        })
    }

    fn desktop(&self, window: Window) -> Result<String> {
        let reply = self
            .conn
            .get_property(
                false,
                window,
                self.atoms._NET_WM_DESKTOP,
                AtomEnum::CARDINAL,
                0,
                1,
            )?
            .reply()?;

        let desktop = match reply.value32().and_then(|mut v| v.next()) {
            Some(ALL_DESKTOPS) | None => "-1".to_string(),
            Some(index) => index.to_string(),
        };
        Ok(desktop)
    }

    fn program(&self, window: Window) -> Result<String> {
        let program = WmClass::get(&self.conn, window)?
            .reply()?
            .map(|class| {
                format!(
                    "{}.{}",
                    String::from_utf8_lossy(class.instance()),
                    String::from_utf8_lossy(class.class())
                )
            })
            .unwrap_or_else(|| UNKNOWN_FIELD.to_string());
        Ok(program)
    }

    fn title(&self, window: Window) -> Result<String> {
        let utf8 = self
            .conn
            .get_property(
                false,
                window,
                self.atoms._NET_WM_NAME,
                self.atoms.UTF8_STRING,
                0,
                u32::MAX,
            )?
            .reply()?;

        if !utf8.value.is_empty() {
            return Ok(String::from_utf8_lossy(&utf8.value).into_owned());
        }

        let legacy = self
            .conn
            .get_property(false, window, self.atoms.WM_NAME, AtomEnum::ANY, 0, u32::MAX)?
            .reply()?;
        Ok(decode_latin1(&legacy.value))
    }

    fn machine(&self, window: Window) -> Result<String> {
        let reply = self
            .conn
            .get_property(
                false,
                window,
                self.atoms.WM_CLIENT_MACHINE,
                AtomEnum::ANY,
                0,
                u32::MAX,
            )?
            .reply()?;
        Ok(String::from_utf8_lossy(&reply.value).into_owned())
    }

    fn describe(&self, window: Window) -> Result<String> {
        Ok(format_record(
            window,
            &self.desktop(window)?,
            &self.program(window)?,
            &self.machine(window)?,
            &self.title(window)?,
        ))
    }

    fn request(&self, id: &str, message_type: u32, data: [u32; 5]) -> Result<()> {
        let window = parse_window_id(id)?;
        self.conn.get_window_attributes(window)?.reply()?;
        send_root_message(&self.conn, self.root, window, message_type, data)
    }
}

#[async_trait::async_trait]
impl WindowSource for EwmhSource {
    fn name(&self) -> &'static str {
        "ewmh"
    }

    async fn list_windows(&self) -> Result<Vec<String>> {
        let windows = self.client_list_stacking()?;
        let mut records = Vec::with_capacity(windows.len());

        for window in windows {
            match self.describe(window) {
                Ok(record) => {
                    trace_if_enabled!("ewmh: {}", record);
                    records.push(record);
                }
                Err(SwitcherError::InvalidId(id)) => {
                    debug!("Окно {} исчезло во время перечисления", id);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(records)
    }

    async fn switch_to(&self, id: &str) -> Result<()> {
        debug!("ewmh: _NET_ACTIVE_WINDOW для {}", id);
        self.request(id, self.atoms._NET_ACTIVE_WINDOW, activate_data())
    }

    async fn kill(&self, id: &str) -> Result<()> {
        debug!("ewmh: _NET_CLOSE_WINDOW для {}", id);
        self.request(id, self.atoms._NET_CLOSE_WINDOW, close_data())
    }
}
