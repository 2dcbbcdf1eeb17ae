use carebook_shared::SessionDto;
use serde::{
  Deserialize,
  Serialize
};
use uuid::Uuid;
use yew::{
  ContextProvider,
  Html,
  function_component,
  html,
  use_effect_with,
  use_state
};
use yew_router::prelude::{
  BrowserRouter,
  Routable,
  Switch
};

use crate::api::invoke_tauri_no_args;
use crate::pages::{
  Dashboard,
  NewAppointment,
  NewAppointmentSuccess
};

#[derive(
  Clone, Debug, PartialEq, Routable,
)]
pub enum Route {
  #[at("/")]
  Dashboard,
  #[at(
    "/patients/:user_id/new-appointment"
  )]
  NewAppointment { user_id: String },
  #[at(
    "/patients/:user_id/new-appointment/success"
  )]
  NewAppointmentSuccess {
    user_id: String
  },
  #[not_found]
  #[at("/404")]
  NotFound
}

/// `?appointmentId=` on the success
/// route.
#[derive(
  Clone,
  Debug,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct SuccessQuery {
  #[serde(rename = "appointmentId")]
  pub appointment_id: Uuid
}

fn switch(route: Route) -> Html {
  match route {
    | Route::Dashboard => {
      html! { <Dashboard /> }
    }
    | Route::NewAppointment {
      user_id
    } => {
      html! { <NewAppointment {user_id} /> }
    }
    | Route::NewAppointmentSuccess {
      user_id
    } => {
      html! { <NewAppointmentSuccess {user_id} /> }
    }
    | Route::NotFound => {
      html! { <div class="panel">{ "Page not found." }</div> }
    }
  }
}

#[function_component(App)]
pub fn app() -> Html {
  let session =
    use_state(|| None::<SessionDto>);
  let load_error =
    use_state(|| None::<String>);

  {
    let session = session.clone();
    let load_error = load_error.clone();
    use_effect_with((), move |_| {
      wasm_bindgen_futures::spawn_local(
        async move {
          match invoke_tauri_no_args::<
            SessionDto
          >("session_get")
          .await
          {
            | Ok(loaded) => {
              tracing::info!(
                user_id = %loaded.user_id,
                "session loaded"
              );
              session.set(Some(loaded));
            }
            | Err(err) => {
              tracing::error!(error = %err, "session_get failed");
              load_error.set(Some(err));
            }
          }
        }
      );
      || ()
    });
  }

  let Some(current) = (*session).clone()
  else {
    return match (*load_error).clone() {
      | Some(err) => html! {
        <div class="panel error">{ format!("Could not load session: {err}") }</div>
      },
      | None => html! {
        <div class="panel">{ "Loading..." }</div>
      }
    };
  };

  html! {
    <ContextProvider<SessionDto> context={current}>
      <BrowserRouter>
        <main class="shell">
          <Switch<Route> render={switch} />
        </main>
      </BrowserRouter>
    </ContextProvider<SessionDto>>
  }
}
