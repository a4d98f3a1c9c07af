//! Visible-text extraction, tokenization and stopword filtering

use crate::config::Language;
use scraper::{ElementRef, Html};
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

/// Tokens shorter than this are discarded
pub const MIN_TOKEN_LENGTH: usize = 3;

/// Elements whose text never counts as visible
const HIDDEN_ELEMENTS: &[&str] = &[
    "script", "style", "svg", "footer", "nav", "meta", "noscript", "template",
];

const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "youre", "youve",
    "youll", "youd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "shes", "her", "hers", "herself", "it", "its", "itself", "they", "them", "their",
    "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "thatll", "these",
    "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "dont", "should", "shouldve", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "arent", "couldn", "couldnt", "didn",
    "didnt", "doesn", "doesnt", "hadn", "hadnt", "hasn", "hasnt", "haven", "havent", "isn",
    "isnt", "ma", "mightn", "mightnt", "mustn", "mustnt", "needn", "neednt", "shan", "shant",
    "shouldn", "shouldnt", "wasn", "wasnt", "weren", "werent", "won", "wont", "wouldn",
    "wouldnt",
];

// Accented forms are omitted: tokens are reduced to ASCII letters before lookup.
const PORTUGUESE_STOPWORDS: &[&str] = &[
    "a", "ao", "aos", "aquela", "aquelas", "aquele", "aqueles", "aquilo", "as", "ate", "com",
    "como", "da", "das", "de", "dela", "delas", "dele", "deles", "depois", "do", "dos", "e",
    "ela", "elas", "ele", "eles", "em", "entre", "era", "eram", "essa", "essas", "esse",
    "esses", "esta", "estamos", "estao", "estas", "estava", "estavam", "este", "esteja",
    "estejam", "estes", "esteve", "estive", "estou", "eu", "foi", "fomos", "for", "foram",
    "forem", "fosse", "fossem", "fui", "ha", "isso", "isto", "ja", "lhe", "lhes", "mais",
    "mas", "me", "mesmo", "meu", "meus", "minha", "minhas", "muito", "na", "nao", "nas", "nem",
    "no", "nos", "nossa", "nossas", "nosso", "nossos", "num", "numa", "o", "os", "ou", "para",
    "pela", "pelas", "pelo", "pelos", "por", "qual", "quando", "que", "quem", "sao", "se",
    "seja", "sejam", "sem", "sera", "seu", "seus", "so", "somos", "sou", "sua", "suas",
    "tambem", "te", "tem", "temos", "tenho", "ter", "teu", "teus", "teve", "tinha", "tinham",
    "tive", "tu", "tua", "tuas", "um", "uma", "voce", "voces", "vos", "pra", "pelo", "onde",
    "cada", "sobre", "todo", "todos", "toda", "todas",
];

const SPANISH_STOPWORDS: &[&str] = &[
    "de", "la", "que", "el", "en", "y", "a", "los", "del", "se", "las", "por", "un", "para",
    "con", "no", "una", "su", "al", "lo", "como", "mas", "pero", "sus", "le", "ya", "o",
    "este", "si", "porque", "esta", "entre", "cuando", "muy", "sin", "sobre", "tambien", "me",
    "hasta", "hay", "donde", "quien", "desde", "todo", "nos", "durante", "todos", "uno", "les",
    "ni", "contra", "otros", "ese", "eso", "ante", "ellos", "e", "esto", "mi", "antes",
    "algunos", "que", "unos", "yo", "otro", "otras", "otra", "el", "tanto", "esa", "estos",
    "mucho", "quienes", "nada", "muchos", "cual", "poco", "ella", "estar", "estas", "algunas",
    "algo", "nosotros", "mi", "mis", "tu", "te", "ti", "tu", "tus", "ellas", "nosotras",
    "vosotros", "vosotras", "os", "mio", "mia", "mios", "mias", "tuyo", "tuya", "tuyos",
    "tuyas", "suyo", "suya", "suyos", "suyas", "nuestro", "nuestra", "nuestros", "nuestras",
    "vuestro", "vuestra", "vuestros", "vuestras", "esos", "esas", "estoy", "estas", "esta",
    "estamos", "estan", "es", "son", "soy", "eres", "somos", "fue", "fueron", "era", "eran",
    "ser", "ha", "han", "he", "hemos", "haber", "tiene", "tienen", "tengo", "tener", "sea",
    "sean", "sido", "estado", "cada", "aqui", "alli", "asi",
];

const FRENCH_STOPWORDS: &[&str] = &[
    "au", "aux", "avec", "ce", "ces", "dans", "de", "des", "du", "elle", "en", "et", "eux",
    "il", "ils", "je", "la", "le", "les", "leur", "lui", "ma", "mais", "me", "meme", "mes",
    "moi", "mon", "ne", "nos", "notre", "nous", "on", "ou", "par", "pas", "pour", "qu", "que",
    "qui", "sa", "se", "ses", "son", "sur", "ta", "te", "tes", "toi", "ton", "tu", "un", "une",
    "vos", "votre", "vous", "cette", "cet", "ceci", "cela", "celui", "celle", "ceux", "sont",
    "suis", "es", "est", "sommes", "etes", "etait", "etaient", "ete", "etre", "avoir", "ai",
    "as", "avons", "avez", "ont", "avait", "avaient", "eu", "sera", "seront", "serait", "fait",
    "faire", "comme", "aussi", "plus", "tres", "tout", "tous", "toute", "toutes", "sans",
    "sous", "entre", "vers", "chez", "donc", "alors", "ainsi", "quand", "dont", "leurs", "peu",
];

const ITALIAN_STOPWORDS: &[&str] = &[
    "ad", "al", "allo", "ai", "agli", "alla", "alle", "con", "col", "coi", "da", "dal", "dallo",
    "dai", "dagli", "dalla", "dalle", "di", "del", "dello", "dei", "degli", "della", "delle",
    "in", "nel", "nello", "nei", "negli", "nella", "nelle", "su", "sul", "sullo", "sui",
    "sugli", "sulla", "sulle", "per", "tra", "contro", "io", "tu", "lui", "lei", "noi", "voi",
    "loro", "mio", "mia", "miei", "mie", "tuo", "tua", "tuoi", "tue", "suo", "sua", "suoi",
    "sue", "nostro", "nostra", "nostri", "nostre", "vostro", "vostra", "vostri", "vostre",
    "mi", "ti", "ci", "vi", "lo", "la", "li", "le", "gli", "ne", "il", "un", "uno", "una",
    "ma", "ed", "se", "perche", "anche", "come", "dov", "dove", "che", "chi", "cui", "non",
    "piu", "quale", "quanto", "quanti", "quella", "quelle", "quelli", "quello", "questa",
    "queste", "questi", "questo", "sono", "sei", "siamo", "siete", "era", "erano", "essere",
    "stato", "stata", "avere", "abbiamo", "avete", "hanno", "aveva", "avevano", "fra", "molto",
];

const GERMAN_STOPWORDS: &[&str] = &[
    "aber", "alle", "allem", "allen", "aller", "alles", "als", "also", "am", "an", "ander",
    "andere", "anderen", "auch", "auf", "aus", "bei", "bin", "bis", "bist", "da", "damit",
    "dann", "der", "den", "des", "dem", "die", "das", "dass", "du", "durch", "ein", "eine",
    "einem", "einen", "einer", "eines", "er", "es", "euer", "eure", "fur", "gegen", "hat",
    "habe", "haben", "hatte", "hatten", "hier", "hin", "ich", "ihr", "ihre", "ihrem", "ihren",
    "ihrer", "im", "in", "ist", "jede", "jeder", "jedes", "kann", "kein", "keine", "mein",
    "meine", "mit", "muss", "nach", "nicht", "noch", "nun", "nur", "ob", "oder", "ohne",
    "sehr", "sein", "seine", "sich", "sie", "sind", "so", "solche", "um", "und", "uns", "unser",
    "unter", "viel", "vom", "von", "vor", "war", "waren", "was", "weil", "wenn", "werden",
    "wie", "wieder", "will", "wir", "wird", "wo", "zu", "zum", "zur", "zwischen", "uber",
];

fn stopword_set(words: &'static [&'static str]) -> HashSet<&'static str> {
    words.iter().copied().collect()
}

/// Returns the stopword set for a language
pub fn stopwords(language: Language) -> &'static HashSet<&'static str> {
    static ENGLISH: OnceLock<HashSet<&'static str>> = OnceLock::new();
    static PORTUGUESE: OnceLock<HashSet<&'static str>> = OnceLock::new();
    static SPANISH: OnceLock<HashSet<&'static str>> = OnceLock::new();
    static FRENCH: OnceLock<HashSet<&'static str>> = OnceLock::new();
    static ITALIAN: OnceLock<HashSet<&'static str>> = OnceLock::new();
    static GERMAN: OnceLock<HashSet<&'static str>> = OnceLock::new();

    match language {
        Language::English => ENGLISH.get_or_init(|| stopword_set(ENGLISH_STOPWORDS)),
        Language::Portuguese => PORTUGUESE.get_or_init(|| stopword_set(PORTUGUESE_STOPWORDS)),
        Language::Spanish => SPANISH.get_or_init(|| stopword_set(SPANISH_STOPWORDS)),
        Language::French => FRENCH.get_or_init(|| stopword_set(FRENCH_STOPWORDS)),
        Language::Italian => ITALIAN.get_or_init(|| stopword_set(ITALIAN_STOPWORDS)),
        Language::German => GERMAN.get_or_init(|| stopword_set(GERMAN_STOPWORDS)),
    }
}

/// Extracts the human-visible text of a parsed document
///
/// Text inside scripts, styles, SVG, navigation, footers and similar
/// non-content elements is dropped. Remaining text nodes are trimmed and
/// joined with single spaces.
pub fn extract_visible_text(document: &Html) -> String {
    let mut fragments = Vec::new();
    collect_text(document.root_element(), &mut fragments);
    fragments.join(" ")
}

fn collect_text(element: ElementRef<'_>, out: &mut Vec<String>) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if HIDDEN_ELEMENTS.contains(&child_element.value().name()) {
                continue;
            }
            collect_text(child_element, out);
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_string());
            }
        }
    }
}

/// Cleans and tokenizes text for frequency analysis
///
/// Characters other than ASCII letters and whitespace are removed (not
/// replaced), the remainder is lowercased and split on whitespace, and
/// stopwords and tokens shorter than [`MIN_TOKEN_LENGTH`] are discarded.
///
/// # Examples
///
/// ```
/// use site_insights::config::Language;
/// use site_insights::crawler::tokenize;
///
/// assert_eq!(tokenize("Hello, world! It's the crawler.", Language::English),
///            vec!["hello", "world", "crawler"]);
/// ```
pub fn tokenize(text: &str, language: Language) -> Vec<String> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    let stop = stopwords(language);
    cleaned
        .split_whitespace()
        .filter(|word| word.len() >= MIN_TOKEN_LENGTH && !stop.contains(word))
        .map(str::to_string)
        .collect()
}

/// Counts token occurrences
pub fn word_frequency<I, S>(tokens: I) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut freq = BTreeMap::new();
    for token in tokens {
        *freq.entry(token.into()).or_insert(0) += 1;
    }
    freq
}

/// Returns the `n` most frequent words, highest count first
///
/// Ties are broken alphabetically so output is stable.
pub fn top_words(freq: &BTreeMap<String, u64>, n: usize) -> Vec<(&str, u64)> {
    let mut words: Vec<(&str, u64)> = freq.iter().map(|(w, &c)| (w.as_str(), c)).collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    words.truncate(n);
    words
}
