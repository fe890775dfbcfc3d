/// New tab page: greeting, date and the shortcut grid

use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::bridge::ChromeStorage;
use crate::shortcuts::ShortcutList;
use crate::ui::components::{ShortcutEditor, ShortcutTile};
use crate::ui::{open_url, persist_shortcuts, upload_if_signed_in};

const WEEKDAYS: [&str; 7] = [
    "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
];

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

pub fn greeting_for_hour(hour: u32) -> &'static str {
    match hour {
        5..=11 => "Good Morning",
        12..=16 => "Good Afternoon",
        _ => "Good Evening",
    }
}

/// "Monday, October 19, 2026"; weekday counts from Sunday = 0, month from January = 0
pub fn long_date(weekday: u32, month: u32, day: u32, year: i32) -> String {
    let weekday = WEEKDAYS.get(weekday as usize).copied().unwrap_or_default();
    let month = MONTHS.get(month as usize).copied().unwrap_or_default();
    format!("{}, {} {}, {}", weekday, month, day, year)
}

#[derive(Clone, PartialEq)]
enum Editing {
    None,
    New,
    Existing(String),
}

#[function_component(NewTab)]
pub fn new_tab() -> Html {
    let shortcuts = use_state(ShortcutList::default);
    let editing = use_state(|| Editing::None);
    let error = use_state(|| None::<String>);

    let now = js_sys::Date::new_0();
    let greeting = greeting_for_hour(now.get_hours());
    let date = long_date(now.get_day(), now.get_month(), now.get_date(), now.get_full_year() as i32);

    // Load shortcuts on mount
    {
        let shortcuts = shortcuts.clone();
        let error = error.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                match ShortcutList::load(&ChromeStorage).await {
                    Ok(list) => shortcuts.set(list),
                    Err(e) => error.set(Some(format!("Failed to load: {}", e))),
                }
            });
            || ()
        });
    }

    // Every mutation goes through here: update the view, then save
    let commit = {
        let shortcuts = shortcuts.clone();
        let error = error.clone();
        move |list: ShortcutList| {
            shortcuts.set(list.clone());
            let error = error.clone();
            spawn_local(async move {
                if let Err(e) = persist_shortcuts(&list).await {
                    error.set(Some(format!("Failed to save: {}", e)));
                    return;
                }
                // failures are logged; the popup shows the sync status
                upload_if_signed_in().await;
            });
        }
    };

    let on_save = {
        let shortcuts = shortcuts.clone();
        let editing = editing.clone();
        let commit = commit.clone();
        Callback::from(move |(name, url): (String, String)| {
            let mut list = (*shortcuts).clone();
            match &*editing {
                Editing::Existing(id) => {
                    list.update(id, &name, &url);
                }
                Editing::New => {
                    list.add(&name, &url);
                }
                Editing::None => return,
            }
            commit(list);
            editing.set(Editing::None);
        })
    };

    let on_delete = {
        let shortcuts = shortcuts.clone();
        let commit = commit.clone();
        Callback::from(move |id: String| {
            let mut list = (*shortcuts).clone();
            if list.remove(&id) {
                commit(list);
            }
        })
    };

    let on_reorder = {
        let shortcuts = shortcuts.clone();
        Callback::from(move |(from, to): (usize, usize)| {
            let mut list = (*shortcuts).clone();
            if list.move_to(from, to) {
                commit(list);
            }
        })
    };

    let on_edit = {
        let editing = editing.clone();
        Callback::from(move |id: String| editing.set(Editing::Existing(id)))
    };

    let on_add = {
        let editing = editing.clone();
        Callback::from(move |_: MouseEvent| editing.set(Editing::New))
    };

    let on_cancel = {
        let editing = editing.clone();
        Callback::from(move |_: ()| editing.set(Editing::None))
    };

    let editor = match &*editing {
        Editing::None => html! {},
        Editing::New => html! {
            <ShortcutEditor key="new" on_save={on_save} on_cancel={on_cancel} />
        },
        Editing::Existing(id) => match shortcuts.get(id) {
            Some(shortcut) => html! {
                <ShortcutEditor
                    key={shortcut.id.clone()}
                    name={shortcut.name.clone()}
                    url={shortcut.url.clone()}
                    on_save={on_save}
                    on_cancel={on_cancel}
                />
            },
            None => html! {},
        },
    };

    html! {
        <div class="newtab">
            <h1 class="greeting">{greeting}</h1>
            <p class="date">{date}</p>

            if let Some(err) = (*error).clone() {
                <p class="error-text">{err}</p>
            }

            <div class="shortcut-grid">
                {for shortcuts.items.iter().enumerate().map(|(index, shortcut)| html! {
                    <ShortcutTile
                        key={shortcut.id.clone()}
                        shortcut={shortcut.clone()}
                        index={index}
                        on_open={Callback::from(open_url)}
                        on_edit={on_edit.clone()}
                        on_delete={on_delete.clone()}
                        on_reorder={Some(on_reorder.clone())}
                    />
                })}
                <button class="shortcut-tile add-tile" onclick={on_add}>{"+"}</button>
            </div>

            {editor}
        </div>
    }
}
