//! Schnittstelle zwischen Waechter und Server
//!
//! Der Pruefzyklus braucht nur zwei Operationen. Die echte Implementierung
//! ist die [`QuerySession`], Tests setzen eine Attrappe ein.

use afkbot_core::{ChannelId, ClientId};
use afkbot_query::{ClientEintrag, QueryResult, QuerySession};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// Client-Liste abrufen und Clients verschieben
#[async_trait]
pub trait ClientVerwaltung: Send {
    /// Alle verbundenen Clients mit Idle-Zeit
    async fn clients_abrufen(&mut self) -> QueryResult<Vec<ClientEintrag>>;

    /// Verschiebt einen Client in den angegebenen Kanal
    async fn verschieben(&mut self, clid: ClientId, cid: ChannelId) -> QueryResult<()>;

    /// false sobald die Verbindung unbrauchbar geworden ist
    fn ist_verbunden(&self) -> bool;
}

#[async_trait]
impl<S> ClientVerwaltung for QuerySession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn clients_abrufen(&mut self) -> QueryResult<Vec<ClientEintrag>> {
        self.client_liste("-times").await
    }

    async fn verschieben(&mut self, clid: ClientId, cid: ChannelId) -> QueryResult<()> {
        self.client_verschieben(clid, cid).await
    }

    fn ist_verbunden(&self) -> bool {
        QuerySession::ist_verbunden(self)
    }
}
