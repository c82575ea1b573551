//! Static table of supported embedding models.
//!
//! The same table validates command-line model names and drives backend and
//! normalization selection, so the two can never disagree.
use std::fmt;
use std::str::FromStr;

use canonical::FormatOptions;
use serde::{Deserialize, Serialize};

use crate::EmbedError;

/// Language of the tweets, selects word vectors and tf-idf history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Fr,
    En,
}

impl Lang {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::Fr => "fr",
            Lang::En => "en",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lang {
    type Err = EmbedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fr" => Ok(Lang::Fr),
            "en" => Ok(Lang::En),
            other => Err(EmbedError::InvalidInput(format!(
                "unknown language `{other}` (expected `fr` or `en`)"
            ))),
        }
    }
}

/// Backend family of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Term-frequency vectors, sparse unless reduced with SVD.
    Lexical,
    /// Averages of pre-trained word vectors.
    StaticWordVectors,
    /// Token-level language models pooled per tweet.
    Contextual,
    /// Sentence-transformer encoders.
    Sentence,
    /// Universal sentence encoders.
    UniversalSentence,
    /// Convolutional image feature extractors.
    Image,
}

macro_rules! models {
    ($($variant:ident => $name:literal, $family:ident;)+) => {
        /// Every supported embedding model.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum ModelKind {
            $(
                #[serde(rename = $name)]
                $variant,
            )+
        }

        impl ModelKind {
            /// All models in registry order.
            pub const ALL: &'static [ModelKind] = &[$(ModelKind::$variant),+];

            /// All model names in registry order.
            pub const NAMES: &'static [&'static str] = &[$($name),+];

            pub fn name(&self) -> &'static str {
                match self {
                    $(ModelKind::$variant => $name,)+
                }
            }

            pub fn family(&self) -> Family {
                match self {
                    $(ModelKind::$variant => Family::$family,)+
                }
            }
        }
    };
}

models! {
    TfidfAllTweets => "tfidf_all_tweets", Lexical;
    TfidfDataset => "tfidf_dataset", Lexical;
    W2vAfpFr => "w2v_afp_fr", StaticWordVectors;
    W2vGnewsEn => "w2v_gnews_en", StaticWordVectors;
    W2vTwitterFr => "w2v_twitter_fr", StaticWordVectors;
    W2vTwitterEn => "w2v_twitter_en", StaticWordVectors;
    Elmo => "elmo", Contextual;
    Bert => "bert", Contextual;
    BertTweets => "bert_tweets", Contextual;
    SbertSts => "sbert_sts", Sentence;
    SbertStsshort => "sbert_stsshort", Sentence;
    SbertTweetsSts => "sbert_tweets_sts", Sentence;
    SbertNliSts => "sbert_nli_sts", Sentence;
    SbertTweetsStsLong => "sbert_tweets_sts_long", Sentence;
    UseMultilingual => "use_multilingual", UniversalSentence;
    Use => "use", UniversalSentence;
    Resnet => "resnet", Image;
    Densenet => "densenet", Image;
}

impl ModelKind {
    pub fn is_text(&self) -> bool {
        self.family() != Family::Image
    }

    /// Normalization applied to tweet texts before this model sees them.
    ///
    /// `None` means the text is used as loaded (image models, and French
    /// word vectors asked for English tweets).
    pub fn format_profile(&self, lang: Lang, hashtag_split: bool) -> Option<FormatOptions> {
        match self.family() {
            Family::Lexical => Some(FormatOptions::lexical(hashtag_split)),
            Family::StaticWordVectors => match (lang, self) {
                (Lang::Fr, _) => Some(FormatOptions::lexical(hashtag_split)),
                (Lang::En, ModelKind::W2vTwitterEn) => Some(FormatOptions::raw(hashtag_split)),
                (Lang::En, ModelKind::W2vGnewsEn) => Some(FormatOptions {
                    remove_mentions: true,
                    ..FormatOptions::raw(hashtag_split)
                }),
                (Lang::En, _) => None,
            },
            Family::Contextual | Family::Sentence | Family::UniversalSentence => {
                Some(FormatOptions::raw(true))
            }
            Family::Image => None,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = EmbedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelKind::ALL
            .iter()
            .copied()
            .find(|model| model.name() == s)
            .ok_or_else(|| EmbedError::UnknownModel(s.to_string()))
    }
}
