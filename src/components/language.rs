use crate::api::*;
use crate::utils::target_value;
use leptos::prelude::*;
use leptos::task::spawn_local;

#[component]
fn LanguageSelect(
    label: &'static str,
    languages: ReadSignal<Vec<LanguageDto>>,
    selected: Signal<String>,
    disabled: Signal<bool>,
    on_change: Callback<String>,
) -> impl IntoView {
    view! {
        <label class="language-select">
            <span class="eyebrow">{label}</span>
            <select
                disabled=move || disabled.get()
                on:change=move |ev| on_change.run(target_value(&ev))
            >
                <For
                    each=move || languages.get()
                    key=|lang| lang.code.clone()
                    children=move |lang| {
                        let code = lang.code.clone();
                        view! {
                            <option
                                value=lang.code.clone()
                                selected=move || selected.get() == code
                            >
                                {format!("{} ({})", lang.name, lang.native_name)}
                            </option>
                        }
                    }
                />
            </select>
        </label>
    }
}

#[component]
pub fn LanguageBar(
    languages: ReadSignal<Vec<LanguageDto>>,
    state: ReadSignal<TranslationStateDto>,
    set_notice: WriteSignal<Option<String>>,
) -> impl IntoView {
    let source = Signal::derive(move || state.get().source_lang);
    let target = Signal::derive(move || state.get().target_lang);
    let busy = Signal::derive(move || {
        let s = state.get();
        s.is_translating || s.is_loading
    });

    let on_source = Callback::new(move |lang: String| {
        spawn_local(async move {
            if let Err(e) = set_source_lang(&lang).await {
                set_notice.set(Some(e));
            }
        });
    });

    let on_target = Callback::new(move |lang: String| {
        spawn_local(async move {
            if let Err(e) = set_target_lang(&lang).await {
                set_notice.set(Some(e));
            }
        });
    });

    let swap_action = move |_| {
        spawn_local(async move {
            if let Err(e) = swap_languages_cmd().await {
                set_notice.set(Some(e));
            }
        });
    };

    view! {
        <div class="language-bar">
            <LanguageSelect label="From" languages selected=source disabled=busy on_change=on_source />
            <button
                class="ghost swap"
                title="Swap languages"
                disabled=move || busy.get()
                on:click=swap_action
            >
                "⇄"
            </button>
            <LanguageSelect label="To" languages selected=target disabled=busy on_change=on_target />
        </div>
    }
}
