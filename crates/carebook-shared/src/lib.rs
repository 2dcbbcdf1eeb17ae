pub mod appointment;
pub mod backend;
pub mod form;
pub mod modal;
pub mod payload;
pub mod physicians;

pub use appointment::{
  Appointment,
  AppointmentStatus,
  DEFAULT_REASON
};
pub use backend::{
  AppointmentBackend,
  BackendError
};
pub use form::{
  AppointmentForm,
  FormField,
  FormMode,
  SubmitError,
  SubmitOutcome,
  SubmitRequest
};
pub use modal::{
  AppointmentModal,
  ModalMode,
  ModalProps
};
pub use payload::{
  AppointmentIdArg,
  AppointmentUpdate,
  AppointmentsListArgs,
  CreateAppointmentParams,
  SessionDto,
  UiLogArg,
  UpdateAppointmentParams
};
pub use physicians::{
  PHYSICIANS,
  Physician,
  find_physician
};
