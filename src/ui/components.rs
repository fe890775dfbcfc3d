/// Reusable UI components

use patternfly_yew::prelude::*;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::shortcuts::{favicon_url, initial, normalize_url};
use crate::tab_data::Shortcut;

const DRAG_FORMAT: &str = "text/plain";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    Save,
    Cancel,
}

/// Keyboard shortcuts inside the editor
pub fn editor_key_action(key: &str) -> Option<EditorAction> {
    match key {
        "Enter" => Some(EditorAction::Save),
        "Escape" => Some(EditorAction::Cancel),
        _ => None,
    }
}

/// Trimmed name and normalized URL, or None when either is blank
pub fn validate_shortcut(name: &str, url: &str) -> Option<(String, String)> {
    let name = name.trim();
    let url = url.trim();
    if name.is_empty() || url.is_empty() {
        return None;
    }
    Some((name.to_string(), normalize_url(url)))
}

#[derive(Properties, PartialEq)]
pub struct ShortcutTileProps {
    pub shortcut: Shortcut,
    pub index: usize,
    pub on_open: Callback<String>,
    pub on_edit: Callback<String>,
    pub on_delete: Callback<String>,
    /// (from, to) positions; tiles are only draggable when set
    #[prop_or_default]
    pub on_reorder: Option<Callback<(usize, usize)>>,
}

#[function_component(ShortcutTile)]
pub fn shortcut_tile(props: &ShortcutTileProps) -> Html {
    let favicon_failed = use_state(|| false);
    let menu_open = use_state(|| false);
    let shortcut = &props.shortcut;

    let on_open = {
        let url = shortcut.url.clone();
        let cb = props.on_open.clone();
        Callback::from(move |_: MouseEvent| cb.emit(url.clone()))
    };

    let on_edit = {
        let id = shortcut.id.clone();
        let cb = props.on_edit.clone();
        let menu_open = menu_open.clone();
        Callback::from(move |e: MouseEvent| {
            e.stop_propagation();
            menu_open.set(false);
            cb.emit(id.clone());
        })
    };

    let on_delete = {
        let id = shortcut.id.clone();
        let cb = props.on_delete.clone();
        let menu_open = menu_open.clone();
        Callback::from(move |e: MouseEvent| {
            e.stop_propagation();
            menu_open.set(false);
            cb.emit(id.clone());
        })
    };

    // Right click opens the edit/delete menu in place of the browser's
    let on_context_menu = {
        let menu_open = menu_open.clone();
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            menu_open.set(true);
        })
    };

    let on_mouse_leave = {
        let menu_open = menu_open.clone();
        Callback::from(move |_: MouseEvent| menu_open.set(false))
    };

    let on_favicon_error = {
        let favicon_failed = favicon_failed.clone();
        Callback::from(move |_: Event| favicon_failed.set(true))
    };

    let index = props.index;
    let ondragstart = Callback::from(move |e: DragEvent| {
        if let Some(transfer) = e.data_transfer() {
            let _ = transfer.set_data(DRAG_FORMAT, &index.to_string());
        }
    });
    let ondragover = Callback::from(|e: DragEvent| e.prevent_default());
    let ondrop = {
        let on_reorder = props.on_reorder.clone();
        Callback::from(move |e: DragEvent| {
            e.prevent_default();
            let from = e
                .data_transfer()
                .and_then(|transfer| transfer.get_data(DRAG_FORMAT).ok())
                .and_then(|data| data.parse::<usize>().ok());
            if let (Some(from), Some(cb)) = (from, on_reorder.as_ref()) {
                if from != index {
                    cb.emit((from, index));
                }
            }
        })
    };

    let icon = match favicon_url(&shortcut.url) {
        Some(src) if !*favicon_failed => html! {
            <img class="shortcut-icon" src={src} alt="" onerror={on_favicon_error} />
        },
        _ => html! {
            <span class="shortcut-initial">{initial(&shortcut.name)}</span>
        },
    };

    html! {
        <div
            class="shortcut-tile"
            title={shortcut.url.clone()}
            onclick={on_open}
            oncontextmenu={on_context_menu}
            onmouseleave={on_mouse_leave}
            draggable={if props.on_reorder.is_some() { "true" } else { "false" }}
            {ondragstart}
            {ondragover}
            {ondrop}
        >
            {icon}
            <span class="shortcut-name">{&shortcut.name}</span>
            if *menu_open {
                <div class="context-menu">
                    <button class="context-menu-item" onclick={on_edit.clone()}>{"Edit"}</button>
                    <button class="context-menu-item danger" onclick={on_delete.clone()}>{"Delete"}</button>
                </div>
            } else {
                <div class="shortcut-actions">
                    <button class="shortcut-action" title="Edit" onclick={on_edit}>{"✎"}</button>
                    <button class="shortcut-action" title="Delete" onclick={on_delete}>{"×"}</button>
                </div>
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct ShortcutEditorProps {
    #[prop_or_default]
    pub name: String,
    #[prop_or_default]
    pub url: String,
    /// Receives the validated (name, url)
    pub on_save: Callback<(String, String)>,
    pub on_cancel: Callback<()>,
}

#[function_component(ShortcutEditor)]
pub fn shortcut_editor(props: &ShortcutEditorProps) -> Html {
    let name = use_state(|| props.name.clone());
    let url = use_state(|| props.url.clone());
    let invalid = use_state(|| false);
    let name_ref = use_node_ref();

    // Focus the first field so Enter and Escape reach the editor
    {
        let name_ref = name_ref.clone();
        use_effect_with((), move |_| {
            if let Some(input) = name_ref.cast::<HtmlInputElement>() {
                let _ = input.focus();
            }
            || ()
        });
    }

    let on_name_input = {
        let name = name.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                name.set(input.value());
            }
        })
    };

    let on_url_input = {
        let url = url.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                url.set(input.value());
            }
        })
    };

    let save = {
        let name = name.clone();
        let url = url.clone();
        let invalid = invalid.clone();
        let on_save = props.on_save.clone();
        move || match validate_shortcut(&name, &url) {
            Some(fields) => on_save.emit(fields),
            None => invalid.set(true),
        }
    };

    let on_save_click = {
        let save = save.clone();
        Callback::from(move |_: MouseEvent| save())
    };

    let on_keydown = {
        let on_cancel = props.on_cancel.clone();
        Callback::from(move |e: KeyboardEvent| match editor_key_action(&e.key()) {
            Some(EditorAction::Save) => save(),
            Some(EditorAction::Cancel) => {
                e.prevent_default();
                on_cancel.emit(());
            }
            None => {}
        })
    };

    let on_cancel_click = {
        let on_cancel = props.on_cancel.clone();
        Callback::from(move |_: MouseEvent| on_cancel.emit(()))
    };

    html! {
        <div class="shortcut-editor" onkeydown={on_keydown}>
            <input
                class="pf-v5-c-form-control"
                type="text"
                placeholder="Name"
                ref={name_ref.clone()}
                value={(*name).clone()}
                oninput={on_name_input}
            />
            <input
                class="pf-v5-c-form-control"
                type="text"
                placeholder="URL"
                value={(*url).clone()}
                oninput={on_url_input}
            />
            if *invalid {
                <p class="editor-error">{"Name and URL are required"}</p>
            }
            <div class="editor-buttons">
                <Button onclick={on_save_click} variant={ButtonVariant::Primary}>{"Save"}</Button>
                <Button onclick={on_cancel_click} variant={ButtonVariant::Link}>{"Cancel"}</Button>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct DomainTagProps {
    pub domain: String,
    pub on_remove: Callback<String>,
}

#[function_component(DomainTag)]
pub fn domain_tag(props: &DomainTagProps) -> Html {
    let on_remove = {
        let domain = props.domain.clone();
        let cb = props.on_remove.clone();
        Callback::from(move |_: MouseEvent| cb.emit(domain.clone()))
    };

    html! {
        <span class="domain-tag">
            {&props.domain}
            <button class="domain-tag-remove" title="Remove" onclick={on_remove}>{"×"}</button>
        </span>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_shortcut_normalizes_url() {
        assert_eq!(
            validate_shortcut("  GitHub ", "github.com"),
            Some(("GitHub".to_string(), "https://github.com".to_string()))
        );
        assert_eq!(
            validate_shortcut("Local", "http://localhost:8080"),
            Some(("Local".to_string(), "http://localhost:8080".to_string()))
        );
    }

    #[test]
    fn test_validate_shortcut_rejects_blank_fields() {
        assert_eq!(validate_shortcut("", "github.com"), None);
        assert_eq!(validate_shortcut("GitHub", "   "), None);
    }

    #[test]
    fn test_editor_keys() {
        assert_eq!(editor_key_action("Enter"), Some(EditorAction::Save));
        assert_eq!(editor_key_action("Escape"), Some(EditorAction::Cancel));
        assert_eq!(editor_key_action("a"), None);
    }
}
