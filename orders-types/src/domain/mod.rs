//! Domain models for the orders service.

pub mod ids;
pub mod money;
pub mod order;
pub mod payment_method;
pub mod user;

pub use ids::{OrderId, PaymentMethodId, ProductId, UserId};
pub use money::{FeeRate, Money};
pub use order::{Order, OrderNote, OrderStatus, PaymentStatus, Pricing};
pub use payment_method::{PaymentDetails, PaymentMethod};
pub use user::AuthenticatedUser;
