//! RFB connection handshake.
//!
//! The sequence, synchronous and in order:
//!
//! 1. Version exchange: the server greets with `RFB xxx.yyy\n`; we always
//!    answer `RFB 003.008\n`.
//! 2. Security negotiation: the server lists its security types; we take
//!    None (1) when offered, otherwise VNC Authentication (2).
//! 3. For VNC Authentication: 16-byte challenge, DES response.
//! 4. SecurityResult: zero is success; anything else carries a reason
//!    string that becomes the error.
//! 5. ClientInit (always shared) and ServerInit.
//!
//! Every failure is fatal to the connection; there are no retries here.

use crate::auth::encrypt_challenge;
use crate::error::ProtocolError;
use crate::io::{RfbInStream, RfbOutStream};
use crate::messages::client::ClientInit;
use crate::messages::server::ServerInit;
use crate::messages::types::{SECURITY_TYPE_NONE, SECURITY_TYPE_VNC_AUTH};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

/// Version string this client always sends.
const CLIENT_VERSION: &[u8; 12] = b"RFB 003.008\n";

/// Run the complete handshake and return the server's init message.
pub async fn perform<R, W>(
    instream: &mut RfbInStream<R>,
    outstream: &mut RfbOutStream<W>,
    password: Option<&str>,
) -> Result<ServerInit, ProtocolError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    exchange_versions(instream, outstream).await?;
    negotiate_security(instream, outstream, password).await?;

    ClientInit { shared: true }.write_to(outstream);
    outstream.flush().await?;

    let server_init = ServerInit::read_from(instream).await?;
    debug!(
        width = server_init.width,
        height = server_init.height,
        name = %server_init.name,
        "handshake complete"
    );
    Ok(server_init)
}

/// Step 1: read the server greeting, answer with our version.
pub async fn exchange_versions<R, W>(
    instream: &mut RfbInStream<R>,
    outstream: &mut RfbOutStream<W>,
) -> Result<(), ProtocolError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut greeting = [0u8; 12];
    instream.read_bytes(&mut greeting).await?;

    let valid = &greeting[0..4] == b"RFB "
        && greeting[7] == b'.'
        && greeting[11] == b'\n'
        && greeting[4..7].iter().all(u8::is_ascii_digit)
        && greeting[8..11].iter().all(u8::is_ascii_digit);
    if !valid {
        return Err(ProtocolError::InvalidVersion(
            String::from_utf8_lossy(&greeting).into_owned(),
        ));
    }

    let version = String::from_utf8_lossy(&greeting[4..11]).into_owned();
    debug!(server_version = %version, "server greeting");
    if version.as_str() < "003.007" {
        // Pre-3.7 servers negotiate security differently; proceed with the
        // 3.8 flow and let the result speak for itself.
        warn!(server_version = %version, "old server version, assuming 3.8 semantics");
    }

    outstream.write_bytes(CLIENT_VERSION);
    outstream.flush().await?;
    Ok(())
}

/// Steps 2-4: pick a security type, authenticate, check SecurityResult.
pub async fn negotiate_security<R, W>(
    instream: &mut RfbInStream<R>,
    outstream: &mut RfbOutStream<W>,
    password: Option<&str>,
) -> Result<(), ProtocolError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let count = instream.read_u8().await?;
    if count == 0 {
        let reason = read_reason(instream).await?;
        return Err(ProtocolError::HandshakeRejected(reason));
    }

    let offered = instream.read_vec(count as usize).await?;
    debug!(?offered, "security types");

    if offered.contains(&SECURITY_TYPE_NONE) {
        outstream.write_u8(SECURITY_TYPE_NONE);
        outstream.flush().await?;
    } else if offered.contains(&SECURITY_TYPE_VNC_AUTH) {
        let password = password.ok_or(ProtocolError::PasswordRequired)?;

        outstream.write_u8(SECURITY_TYPE_VNC_AUTH);
        outstream.flush().await?;

        let mut challenge = [0u8; 16];
        instream.read_bytes(&mut challenge).await?;
        let response = encrypt_challenge(&challenge, password)?;
        outstream.write_bytes(&response);
        outstream.flush().await?;
    } else {
        return Err(ProtocolError::NoAcceptableSecurityType(offered));
    }

    let result = instream.read_u32().await?;
    if result != 0 {
        let reason = read_reason(instream).await?;
        return Err(ProtocolError::AuthenticationFailed(reason));
    }
    Ok(())
}

/// Read a length-prefixed failure reason string.
async fn read_reason<R: AsyncRead + Unpin>(
    instream: &mut RfbInStream<R>,
) -> Result<String, ProtocolError> {
    let length = instream.read_u32().await? as usize;
    Ok(instream.read_string(length).await?)
}
