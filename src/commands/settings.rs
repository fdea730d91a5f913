use crate::advice::types::Language;
use crate::state::{Context, MAX_RESULTS_CAP};

#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum LanguageChoice {
    English,
    Hindi,
    Kannada,
    Marathi,
    Tamil,
    Telugu,
    Bengali,
    Gujarati,
}

impl From<LanguageChoice> for Language {
    fn from(choice: LanguageChoice) -> Self {
        match choice {
            LanguageChoice::English => Language::English,
            LanguageChoice::Hindi => Language::Hindi,
            LanguageChoice::Kannada => Language::Kannada,
            LanguageChoice::Marathi => Language::Marathi,
            LanguageChoice::Tamil => Language::Tamil,
            LanguageChoice::Telugu => Language::Telugu,
            LanguageChoice::Bengali => Language::Bengali,
            LanguageChoice::Gujarati => Language::Gujarati,
        }
    }
}

/// Show or change your language, anonymity, location and result count
#[poise::command(slash_command, guild_only)]
pub async fn settings(
    ctx: Context<'_>,
    #[description = "Interface language"] language: Option<LanguageChoice>,
    #[description = "Anonymous mode (don't ask personal info)"] anonymous: Option<bool>,
    #[description = "Pincode or city for nearby search (empty to clear)"] location: Option<String>,
    #[description = "Results per category (1-10)"]
    #[min = 1]
    #[max = 10]
    results: Option<u32>,
) -> Result<(), anyhow::Error> {
    let user_id = ctx.author().id.get();

    let summary = {
        let mut all = ctx.data().settings.write().await;
        let entry = all.entry(user_id).or_default();
        if let Some(lang) = language {
            entry.language = lang.into();
        }
        if let Some(anon) = anonymous {
            entry.anonymous = anon;
        }
        if let Some(loc) = location {
            let loc = loc.trim();
            entry.location = (!loc.is_empty()).then(|| loc.to_string());
        }
        if let Some(n) = results {
            entry.max_results = (n as usize).clamp(1, MAX_RESULTS_CAP);
        }
        entry.describe()
    };

    ctx.say(summary).await?;
    Ok(())
}
