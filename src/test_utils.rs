use crate::channel_utils::sync_channel::{create_unix_channel_pair, UnixChannel};
use crate::party::{PartyContext, PartyId};
use scuttlebutt::AesRng;

/// Run `p0` on this thread and `p1` on a spawned one, connected by a unix socket pair.
pub(crate) fn run_two_party<F0, F1, T0, T1>(p0: F0, p1: F1) -> (T0, T1)
where
    F0: FnOnce(PartyContext<UnixChannel, AesRng>) -> T0,
    F1: FnOnce(PartyContext<UnixChannel, AesRng>) -> T1 + Send + 'static,
    T1: Send + 'static,
{
    let (ch0, ch1) = create_unix_channel_pair().unwrap();

    let handle = std::thread::spawn(move || p1(PartyContext::new(PartyId::P1, ch1, AesRng::new())));
    let r0 = p0(PartyContext::new(PartyId::P0, ch0, AesRng::new()));
    let r1 = handle.join().unwrap();

    (r0, r1)
}
