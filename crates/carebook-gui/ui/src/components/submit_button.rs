use carebook_shared::form::{ButtonVariant, SubmitButton as ButtonState};
use yew::{Html, Properties, classes, function_component, html};

#[derive(Properties, PartialEq)]
pub struct SubmitButtonProps {
    pub state: ButtonState,
}

#[function_component(SubmitButton)]
pub fn submit_button(props: &SubmitButtonProps) -> Html {
    let variant = match props.state.variant {
        ButtonVariant::Primary => "primary",
        ButtonVariant::Danger => "danger",
    };

    html! {
        <button
            type="submit"
            class={classes!("btn", "wide", variant, props.state.loading.then_some("loading"))}
            disabled={props.state.loading}
        >
            {
                if props.state.loading {
                    html! { <span class="spinner" aria-hidden="true"></span> }
                } else {
                    html! {}
                }
            }
            { props.state.text() }
        </button>
    }
}
