//! Dashboard-side building blocks shared by every page: the application
//! context, the route guard, the notification channel and list helpers.

pub mod context;
pub mod notifications;
pub mod route_guard;
pub mod socket_io;
pub mod view;

pub use context::AppContext;
pub use notifications::{
    ChannelEvent, ConnectionState, NotificationError, NotificationHub, NotificationTransport,
    ReconnectPolicy, SocketConnection, SocketFrame, Subscription,
};
pub use route_guard::{
    GuardDecision, GuardError, GuardState, JwtSessionVerifier, RouteGuard, RouteScope,
    SessionClaims, SessionVerifier, route_guard_middleware,
};
pub use socket_io::SocketIoTransport;
pub use view::{LatestRequest, Ticket, filter_referral_codes, visible_range};
