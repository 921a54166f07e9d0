pub mod import;
pub mod locality;
pub mod medicine;
pub mod reservation;
pub mod user;

pub use import::{parse_import, ImportBatch, LineError};
pub use locality::LocalityMap;
pub use medicine::{Medicine, MedicineFields};
pub use reservation::{ReleasedReservation, Reservation, ReservationDetails};
pub use user::{Role, User};
