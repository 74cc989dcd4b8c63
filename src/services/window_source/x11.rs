use crate::error::{Result, SwitcherError};
use crate::{switcher_error, trace_if_enabled};
use smallvec::SmallVec;
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ClientMessageEvent, ConnectionExt as _, EventMask, Window,
};
use x11rb::rust_connection::RustConnection;

use super::records::{decode_latin1, format_record, join_wm_class, parse_window_id, UNKNOWN_FIELD};
use super::r#trait::WindowSource;

/// Источник запроса в клиентских сообщениях EWMH: пейджер
const SOURCE_PAGER: u32 = 2;

const PROTOCOL_ATOMS: [&str; 6] = [
    "WM_CLASS",
    "WM_CLIENT_MACHINE",
    "WM_NAME",
    "_NET_CLIENT_LIST_STACKING",
    "_NET_ACTIVE_WINDOW",
    "_NET_CLOSE_WINDOW",
];

struct ProtocolAtoms {
    wm_class: Atom,
    wm_client_machine: Atom,
    wm_name: Atom,
    client_list_stacking: Atom,
    active_window: Atom,
    close_window: Atom,
}

impl ProtocolAtoms {
    fn intern_all(conn: &RustConnection) -> Result<Self> {
        let cookies = PROTOCOL_ATOMS
            .iter()
            .map(|name| conn.intern_atom(false, name.as_bytes()))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut atoms: SmallVec<[Atom; 6]> = SmallVec::new();
        for cookie in cookies {
            atoms.push(cookie.reply()?.atom);
        }

        Ok(Self {
            wm_class: atoms[0],
            wm_client_machine: atoms[1],
            wm_name: atoms[2],
            client_list_stacking: atoms[3],
            active_window: atoms[4],
            close_window: atoms[5],
        })
    }
}

/// Прямой доступ к X11: свойства окон читаются и декодируются вручную.
pub struct X11Source {
    conn: RustConnection,
    screen_num: usize,
    root: Window,
    atoms: ProtocolAtoms,
}

impl X11Source {
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None)?;
        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| screen.root)
            .ok_or_else(|| switcher_error!(backend_unavailable, "нет экрана {}", screen_num))?;
        let atoms = ProtocolAtoms::intern_all(&conn)?;

        info!("Подключение к X11 установлено (экран {})", screen_num);
        Ok(Self {
            conn,
            screen_num,
            root,
            atoms,
        })
    }

    fn stacking_order(&self) -> Result<Vec<Window>> {
        let reply = self
            .conn
            .get_property(
                false,
                self.root,
                self.atoms.client_list_stacking,
                AtomEnum::WINDOW,
                0,
                u32::MAX,
            )?
            .reply()?;

        if reply.type_ == x11rb::NONE {
            return Err(SwitcherError::BackendUnavailable(
                "оконный менеджер не поддерживает _NET_CLIENT_LIST_STACKING".to_string(),
            ));
        }

        Ok(reply.value32().map(|ids| ids.collect()).unwrap_or_default())
    }

    fn raw_property(&self, window: Window, property: Atom) -> Result<Vec<u8>> {
        let reply = self
            .conn
            .get_property(false, window, property, AtomEnum::ANY, 0, u32::MAX)?
            .reply()?;
        Ok(reply.value)
    }

    fn describe(&self, window: Window) -> Result<String> {
        let machine = self.raw_property(window, self.atoms.wm_client_machine)?;
        let machine = if machine.is_empty() {
            UNKNOWN_FIELD.to_string()
        } else {
            String::from_utf8_lossy(&machine).into_owned()
        };
        let class = join_wm_class(&self.raw_property(window, self.atoms.wm_class)?);
        let title = decode_latin1(&self.raw_property(window, self.atoms.wm_name)?);

        Ok(format_record(
            window,
            &self.screen_num.to_string(),
            &class,
            &machine,
            &title,
        ))
    }

    fn request(&self, id: &str, message_type: Atom, data: [u32; 5]) -> Result<()> {
        let window = parse_window_id(id)?;
        // BadWindow превращается в InvalidId
        self.conn.get_window_attributes(window)?.reply()?;
        send_root_message(&self.conn, self.root, window, message_type, data)
    }
}

/// Отправить клиентское сообщение корневому окну, как того требует EWMH.
pub(super) fn send_root_message(
    conn: &RustConnection,
    root: Window,
    window: Window,
    message_type: Atom,
    data: [u32; 5],
) -> Result<()> {
    let event = ClientMessageEvent::new(32, window, message_type, data);
    conn.send_event(
        false,
        root,
        EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
        event,
    )?;
    conn.flush()?;
    Ok(())
}

pub(super) fn activate_data() -> [u32; 5] {
    [SOURCE_PAGER, x11rb::CURRENT_TIME, 0, 0, 0]
}

pub(super) fn close_data() -> [u32; 5] {
    [x11rb::CURRENT_TIME, SOURCE_PAGER, 0, 0, 0]
}

#[async_trait::async_trait]
impl WindowSource for X11Source {
    fn name(&self) -> &'static str {
        "x11"
    }

    async fn list_windows(&self) -> Result<Vec<String>> {
        let windows = self.stacking_order()?;
        let mut records = Vec::with_capacity(windows.len());

        for window in windows {
            match self.describe(window) {
                Ok(record) => {
                    trace_if_enabled!("x11: {}", record);
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
        debug!("x11: активация окна {}", id);
        self.request(id, self.atoms.active_window, activate_data())
    }

    async fn kill(&self, id: &str) -> Result<()> {
        debug!("x11: закрытие окна {}", id);
        self.request(id, self.atoms.close_window, close_data())
    }
}
