//! Download client abstraction.
//!
//! This module provides a `DownloadClient` trait for handing search results
//! to a torrent client (qBittorrent), and a `DownloadDispatcher` that picks
//! the configured client for a request.

mod dispatch;
mod qbittorrent;
mod types;

pub use dispatch::{
    ClientStatus, ClientSummary, DispatchError, DownloadClientConnector, DownloadDispatcher,
    DownloadReceipt, DownloadRequest, QBittorrentConnector,
};
pub use qbittorrent::QBittorrentClient;
pub use types::*;
