pub mod ms {
    pub const POLL_INTERVAL: u64 = 100;
    pub const NETWORK_IDLE: u64 = 500;
    pub const VIEWPORT_SETTLE: u64 = 50;
    pub const TITLE_WAIT: u64 = 5000;
    pub const DESCRIPTION_CLICK: u64 = 5000;
    pub const TRANSCRIPT_BUTTON_WAIT: u64 = 15000;
    pub const TRANSCRIPT_BUTTON_FALLBACK: u64 = 3000;
    pub const TRANSCRIPT_BUTTON_CLICK: u64 = 10000;
    pub const SEGMENTS_WAIT: u64 = 10000;
    pub const ACTIONABLE_WAIT: u64 = 5000;
}

pub mod secs {
    pub const READY_STATE: u64 = 5;
    pub const REQUEST: u64 = 120;
    pub const BROWSER_CLOSE: u64 = 10;
}
