/// Wire models of the user, business, product and order services
///
/// Field names follow the backends' camelCase JSON. Timestamps are the
/// services' zone-less `LocalDateTime`, prices are `BigDecimal` on the
/// wire and `Decimal` here.

pub mod address;
pub mod business;
pub mod envelope;
pub mod order;
pub mod otp;
pub mod product;
pub mod session;
pub mod user;

pub use address::{Address, AddressRequest, AddressType};
pub use business::{
    BusinessAddress, BusinessProfile, BusinessRegistration, BusinessSearch,
    BusinessServiceOffering, BusinessStatus, BusinessUpdate, BusinessVerification, DayOfWeek,
    OperatingHours, ServiceType, VerificationStatus,
};
pub use envelope::{Page, PageQuery, SortDirection, StandardResponse};
pub use order::{DeliveryAddress, NewOrder, NewOrderItem, Order, OrderStatus, PaymentStatus};
pub use otp::{OtpResponse, OtpStatus, OtpType};
pub use product::{Product, ProductCategory, ProductCreate, ProductType, ProductUpdate};
pub use session::{CreateSession, LoginRequest, LoginResponse, SessionInfo};
pub use user::{
    RegisterUserRequest, Role, UpdateUserRequest, UserProfile, UserStatus, UserValidation,
};
