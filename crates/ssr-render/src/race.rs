//! First-settled-wins race between a render and the redirect signal.

use std::future::Future;

use futures::future::{self, Either};

/// Which side of the race settled first.
#[derive(Debug)]
pub enum RaceWinner<R, S> {
    /// The render finished (successfully or not).
    Rendered(R),
    /// The redirect signal fired.
    Redirected(S),
}

impl<R, S> RaceWinner<R, S> {
    /// Check whether the redirect signal won.
    pub fn is_redirected(&self) -> bool {
        matches!(self, Self::Redirected(_))
    }
}

/// Await whichever of `render` and `signal` settles first.
///
/// The render is polled first, so when both are ready on the same poll the
/// render wins. The losing future is dropped before this returns, which
/// cancels an abandoned render at its next suspension point.
pub async fn race<A, B>(render: A, signal: B) -> RaceWinner<A::Output, B::Output>
where
    A: Future + Unpin,
    B: Future + Unpin,
{
    match future::select(render, signal).await {
        Either::Left((rendered, _signal)) => RaceWinner::Rendered(rendered),
        Either::Right((redirect, abandoned)) => {
            drop(abandoned);
            tracing::debug!("redirect signal won the race, render abandoned");
            RaceWinner::Redirected(redirect)
        }
    }
}
