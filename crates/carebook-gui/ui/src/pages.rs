mod dashboard;
mod new_appointment;
mod success;

pub use dashboard::Dashboard;
pub use new_appointment::NewAppointment;
pub use success::NewAppointmentSuccess;
