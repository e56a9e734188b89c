#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ServerStatus {
    #[default]
    Idle,
    Busy,
}

impl ServerStatus {
    pub fn is_busy(&self) -> bool {
        *self == ServerStatus::Busy
    }
}
