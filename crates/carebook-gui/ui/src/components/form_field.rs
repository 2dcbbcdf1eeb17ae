use carebook_shared::form::{FieldAccess, FieldKind};
use carebook_shared::{FormField, PHYSICIANS, find_physician};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use web_sys::{HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};
use yew::{Callback, Event, Html, InputEvent, Properties, TargetCast, classes, function_component, html};

const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";
const DISPLAY_FORMAT: &str = "%d/%m/%Y - %-I:%M %p";

#[derive(Properties, PartialEq)]
pub struct TextFieldProps {
    pub field: FormField,
    pub value: String,
    pub access: FieldAccess,
    pub error: Option<String>,
    pub on_change: Callback<(FormField, String)>,
}

/// Select or textarea, depending on the field kind.
#[function_component(TextField)]
pub fn text_field(props: &TextFieldProps) -> Html {
    if props.access == FieldAccess::Hidden {
        return html! {};
    }

    let field = props.field;
    let read_only = props.access == FieldAccess::ReadOnly;

    let control = match field.kind() {
        FieldKind::Select => {
            let on_change = props.on_change.clone();
            let onchange = Callback::from(move |event: Event| {
                let select: HtmlSelectElement = event.target_unchecked_into();
                on_change.emit((field, select.value()));
            });
            let selected = find_physician(&props.value);

            html! {
                <div class="select-row">
                    {
                        match selected {
                            Some(doctor) => html! {
                                <img class="avatar" src={doctor.image} alt={doctor.name} width="32" height="32" />
                            },
                            None => html! {},
                        }
                    }
                    <select name={field.name()} disabled={read_only} {onchange}>
                        <option value="" disabled=true selected={selected.is_none()}>
                            { field.placeholder() }
                        </option>
                        {
                            for PHYSICIANS.iter().map(|doctor| html! {
                                <option
                                    value={doctor.name}
                                    selected={selected.is_some_and(|s| s.name == doctor.name)}
                                >
                                    { doctor.name }
                                </option>
                            })
                        }
                    </select>
                </div>
            }
        }
        FieldKind::Textarea | FieldKind::DatePicker => {
            let on_change = props.on_change.clone();
            let oninput = Callback::from(move |event: InputEvent| {
                let area: HtmlTextAreaElement = event.target_unchecked_into();
                on_change.emit((field, area.value()));
            });

            html! {
                <textarea
                    name={field.name()}
                    placeholder={field.placeholder()}
                    value={props.value.clone()}
                    readonly={read_only}
                    disabled={read_only}
                    {oninput}
                />
            }
        }
    };

    html! {
        <FieldShell field={field} error={props.error.clone()}>
            { control }
        </FieldShell>
    }
}

#[derive(Properties, PartialEq)]
pub struct ScheduleFieldProps {
    pub value: Option<DateTime<Utc>>,
    pub access: FieldAccess,
    pub error: Option<String>,
    pub on_change: Callback<Option<DateTime<Utc>>>,
}

#[function_component(ScheduleField)]
pub fn schedule_field(props: &ScheduleFieldProps) -> Html {
    if props.access == FieldAccess::Hidden {
        return html! {};
    }

    let on_change = props.on_change.clone();
    let onchange = Callback::from(move |event: Event| {
        let input: HtmlInputElement = event.target_unchecked_into();
        on_change.emit(from_input_value(&input.value()));
    });
    let shown = props.value.map(format_local).unwrap_or_default();

    html! {
        <FieldShell field={FormField::Schedule} error={props.error.clone()}>
            <input
                type="datetime-local"
                name={FormField::Schedule.name()}
                value={to_input_value(props.value)}
                disabled={props.access == FieldAccess::ReadOnly}
                {onchange}
            />
            <span class="date-preview">{ shown }</span>
        </FieldShell>
    }
}

#[derive(Properties, PartialEq)]
struct FieldShellProps {
    field: FormField,
    error: Option<String>,
    children: Html,
}

#[function_component(FieldShell)]
fn field_shell(props: &FieldShellProps) -> Html {
    html! {
        <div class={classes!("form-field", props.error.is_some().then_some("invalid"))}>
            <label for={props.field.name()}>{ props.field.label() }</label>
            { props.children.clone() }
            {
                match props.error.as_deref() {
                    Some(message) => html! { <p class="field-error">{ message }</p> },
                    None => html! {},
                }
            }
        </div>
    }
}

/// Date picker text, in the browser's timezone.
pub fn format_local(value: DateTime<Utc>) -> String {
    value.with_timezone(&Local).format(DISPLAY_FORMAT).to_string()
}

fn to_input_value(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|dt| dt.with_timezone(&Local).format(INPUT_FORMAT).to_string())
        .unwrap_or_default()
}

fn from_input_value(raw: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), INPUT_FORMAT).ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}
