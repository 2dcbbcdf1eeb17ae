mod appointment_form;
mod appointment_modal;
mod form_field;
mod submit_button;

pub use appointment_form::CreateAppointmentForm;
pub use appointment_modal::AppointmentModalView;
pub use form_field::format_local;
