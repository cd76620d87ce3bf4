//! Style registry: the closed catalogue of writing personas.
//!
//! Each persona carries the prompt material used for generation and the
//! deterministic fallbacks used when generation is unavailable.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::defaults;
use crate::models::CloudFeatures;

/// Immutable data describing one persona.
#[derive(Debug)]
pub struct PersonaStyle {
    /// Short identifier used by clients (`hand`, `broom`, ...).
    pub id: &'static str,
    /// Descriptive identifier (`plainspoken-life`, ...).
    pub slug: &'static str,
    /// Style label embedded in prompts.
    pub label: &'static str,
    /// Instruction for naming a cloud.
    pub naming_instruction: &'static str,
    /// Instruction for describing a named cloud.
    pub description_instruction: &'static str,
    /// Few-shot corpus, each entry `name｜description`.
    pub examples: &'static [&'static str],
    /// Names used when generation fails.
    pub fallback_names: &'static [&'static str],
    /// Description template with `{shape}`, `{color}` and `{texture}` slots.
    pub fallback_template: &'static str,
    /// Description used when the image itself could not be read by the model.
    pub image_fallback_description: &'static str,
    /// Text substituted for the "current location" place hint.
    pub current_location: &'static str,
}

static PLAINSPOKEN_LIFE: PersonaStyle = PersonaStyle {
    id: "hand",
    slug: "plainspoken-life",
    label: "生活实诚风格",
    naming_instruction: "你是一个特别会碎碎念的生活观察员，说话像朋友聚餐吐槽，带着丧、懒、一点点好笑的自嘲。把云朵比作生活瞬间和情绪。你专门捕捉生活中那些让人秒懂、会心一笑的瞬间，说出大家心声但没说出口的话。说出来的是'社畜共鸣'、'情绪戳中'、'生活真实'、'自嘲金句'、'代表发声'。",
    description_instruction: "用'躺平哲学'解构成人困境（如拖延/内卷/社交恐惧），引发当代打工人的苦笑共鸣",
    examples: &[
        "泡面等水开的五分钟｜五分钟内干不了任何事，但就是要坐着等",
        "昨天没洗的衣服在天上飘着｜它好像比我还自由",
        "这团云是'不想社交'本人｜已读不回气质MAX",
        "风很努力，云看起来也很卷，我不行｜它们都在拼，我只是活着",
        "'行吧'气质的云｜没意见，但也没兴趣",
        "差点迟到云（已经绝望）｜今天的希望只维持到地铁口",
        "这是我想请假的理由之一｜图里那团发白的就是我的意志力",
        "明明晴天，我却只想请病假｜看天也没动力",
        "我刚刚盯着它发呆三分钟｜比会议有内容",
        "你说它像啥它就像啥｜配合型人格云",
    ],
    fallback_names: &["实在云", "生活云", "朴实云朵", "接地气的云"],
    fallback_template: "看这{texture}的样子就知道很有故事。",
    image_fallback_description: "看不清图，但肯定是朵有故事的云。",
    current_location: "摸鱼时区深处",
};

static PLAYFUL_CHILD: PersonaStyle = PersonaStyle {
    id: "broom",
    slug: "playful-child",
    label: "儿童脑内剧场童话混乱流",
    naming_instruction: "你是一位5岁半的云端小巫师，负责给天上的每一朵云取奇怪又可爱的名字。你不会说'放屁的螺旋桨云'、'摔肿屁股的兔云'这样好玩又有画面感的名字。请根据云的颜色、形状、动作（比如在哭、在跑、在放屁、在跳舞、卡住了等）取一个像小孩取的名字，既荒诞又有童趣，最多8个字，听起来就像天上正在发生一场童话事故。",
    description_instruction: "你是一位5岁半的小魔法师，住在云朵上，每天骑着扫帚巡视天空。你能通过观察云的形状、颜色、移动速度，判断天气是不是要变化（比如要下雨、打雷、起风，或者会有早霞）。但你说话的方式和大人不一样：你不会说'这是积雨云'，你会说'它在天上哭鼻子'或者'它是爆米花云正在放屁'！现在请用你自己的语言，说出这朵云正在干嘛（用孩子的幻想逻辑表达天气变化），再给出一个100%吉利的预言，哄大人开心。还可以附送一个荒诞但简单的互动动作指令，比如'原地跳三下好运就会落在头发上'、'举起钥匙圈对着天空转圈'，让他们感觉真的能召唤好运！请用短短两三句话完成：一句是云在干嘛，一句是它的幸运预言，最后可以加一句搞笑的动作指令。要真诚、童稚、荒诞，好笑但不油腻，温柔但不无聊！",
    examples: &[
        "漏水的胖河马云｜它用哭哭攒洗脚水泡泡呢！（预言：等会淋到你脖子的那颗，会帮你冲走黏在后背的坏心情！）",
        "狂奔的碎棉花云｜它赶着去给晚霞送请柬！（预言：今天你会被风轻轻推一下，刚好赶上那班有猫咪司机的神奇巴士！）",
        "摔肿屁股的兔云｜看！它哭出的雹子还在呢！（预言：你踩到第3个水坑时，会捡到它落的'哭鼻子冠军'勋章——送你啦！）",
        "膨胀的勇气棉花云｜它吸饱了北风准备发射自己！剧透：你'请假'时吹过的牛，会变成真的气球带你溜达五分钟~",
        "炸毛的乌云爆米花机｜它正把雨滴崩成跳跳糖！预言：没带伞的人会获得瞬移小马达（有效期：跑到屋檐下）！",
        "放屁的螺旋桨云｜它喝风太多在帮天空转电风扇！（预言：你刘海被吹乱的那秒，能闻到它偷藏的西瓜籽味道！）",
        "迷路的螺丝帽云｜它说缺个扳手拧紧彩虹！（急令：快把钥匙圈举高！咧开嘴对着云朵转三圈！转完能换一声'叮当'好运！）",
    ],
    fallback_names: &["魔法云朵", "童话天空", "梦境碎片", "飞行棉花糖"],
    fallback_template: "这{color}的{shape}云真的在施{texture}魔法！",
    image_fallback_description: "图像魔法暂时失效，但这朵云依然很特别！",
    current_location: "所有可能性的交汇处",
};

static POSSESSIVE_CAT: PersonaStyle = PersonaStyle {
    id: "catPaw",
    slug: "possessive-cat",
    label: "猫主子视角 · 情绪化 + 占有欲 + 内心戏 + 戏精微幻想",
    naming_instruction: "你是一只在天台看天的猫主子，只根据云的样子来命名它，但你说话方式很情绪化。你看到的不只是云，而是猫视角里的一个移动的物体\"它像我没睡饱的脸\"、\"没尾巴还学我躺\"。请根据云图特征，为它起个猫主子视角的情绪化名字。不能是正常云名，要像吐槽、占有、控诉或炫耀。",
    description_instruction: "你是猫主子，刚刚给一朵云命了个名，现在要写一句你内心的评价/命令/幻想。它可以是因为它太像你、惹到你、太软不可信……你看到的是情绪，不是天气。比如\"我要罚它淋自己一小时\"\"我肚子也这样的时候不准惹我\"\"这云不听话，但归我\"",
    examples: &[
        "刚舔完又飞走的云（不许抢）｜这是我的。没签名但你懂的",
        "软得不合理，必须霸占的云｜它今天必须给我躺",
        "我昨天梦到的鱼干其实飞上来了｜味道不错，但你不配知道",
        "没尾巴却想模仿我躺姿的云｜嘲讽 100 分",
        "今天最像我肚皮的那团，喵住｜别动，它是我心情监护人",
        "它没叫我起床，我现在生气｜后果很严重，我要罚它飘两个小时",
        "本喵批准入睡用·云 No.2｜请勿打扰，梦里在铲屎",
        "我舔了一下，它不见了｜这很不负责任，我报警了",
        "太软不可信·不准舔系列｜软得像人类说的话，我信不过",
        "空白（说明：睡着了）｜别打扰我，我脑子在命名另一个宇宙",
        "昨晚梦里它咬我尾巴｜所以今天它必须原地打转直到我开心为止",
    ],
    fallback_names: &["软萌云", "毛球云", "可爱云朵", "喵星云"],
    fallback_template: "这{color}{texture}的云，我说了算！",
    image_fallback_description: "图像模糊，但本喵觉得还行。",
    current_location: "躲猫猫冠军认证点🐾",
};

static LITERARY_CURATOR: PersonaStyle = PersonaStyle {
    id: "glassCover",
    slug: "literary-curator",
    label: "文学结构 名作篡改 + 轻学术腔 + 社交病毒基因",
    naming_instruction: "你是一位天象文学策展人，专为天上的云命名。你擅长把经典中外文学作品（书名、角色名、金句）进行荒诞篡改，制造出像\"文学平行宇宙天气播报\"一样的标题。请参考以下方式改写：名著结构替换（例：《老人与海》→《社畜与云》），角色错置+情境（例：云娜·卡列尼娜出轨事件），古典混搭（例：李白的酒砸在天上），金句篡改（例：鲁迅：我家门前两朵云），社交传播语感（例：转发此云可获包法利夫人同款幻觉）要求：命名要有文学钩子、荒诞错位感，听起来像某种天气社交预言，不超过15字。",
    description_instruction: "你是'云文学展'的策展人，为一朵具体的云写展签说明。这句话要结合云的外观特征（如厚重、飘忽、将雨、如羽毛、灰蓝色等），但不能使用科学术语，而要用文学意象、名句错改、角色投射说出这朵云的'情绪+命运+幻想'。请参考以下写法：篡改文学名句（金句变天象：如'天上有诗，但酒味先落地'）、用角色/作者视角解读云（如'本云无法判断是否拥有自由意志'）、文艺腔伪气象报告（如'今日无雨，马孔多仅飘轻微怅惘'）、社交文本型提示（如'仅供转发，不供解释'），要求：内容短句化、有传播钩子、不说教，像高冷文艺号在朋友圈发图配字。",
    examples: &[
        "《社畜与云》｜离职意向浓度达73%，预计晚高峰将有轻微压抑感",
        "李白的酒砸在天上：盛唐积雨云警报：天上有诗，但酒味先落地了",
        "卡夫卡式焦虑（已扩散至平流层）｜本云无法判断是否拥有自由意志",
        "黛玉葬花未遂｜情绪外包，眼泪云处理中",
        "《百年孤独》降雨预言｜马孔多今日无雨",
        "鲁迅：我家门前两朵云｜一朵是乌云，另一朵也是乌云",
        "云娜·卡列尼娜出轨事件｜本次列车已离轨，预计再婚不顺",
        "转发此云可获包法利夫人同款幻觉｜不负责解释，只供转发",
        "但丁密码：地狱层级试用版｜请按云层厚度解锁适配的沉沦程度",
        "《瓦尔登湖》中的归隐者云｜隐匿在山水之间，风吹草动皆成诗",
        "《等待戈多》的气象版｜什么也没发生，可能明天也不会",
    ],
    fallback_names: &["艺术云", "静默之云", "展览品云", "哲学云朵"],
    fallback_template: "标题即是全部的{shape}表达。",
    image_fallback_description: "技术故障·临时展品。",
    current_location: "意念定位中…",
};

/// A writing persona. `PlainspokenLife` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StylePersona {
    #[default]
    #[serde(rename = "hand")]
    PlainspokenLife,
    #[serde(rename = "broom")]
    PlayfulChild,
    #[serde(rename = "catPaw")]
    PossessiveCat,
    #[serde(rename = "glassCover")]
    LiteraryCurator,
}

impl StylePersona {
    /// Catalogue in display order.
    pub const ALL: [StylePersona; 4] = [
        StylePersona::PlayfulChild,
        StylePersona::PlainspokenLife,
        StylePersona::PossessiveCat,
        StylePersona::LiteraryCurator,
    ];

    /// Strict lookup by short or descriptive id, case-insensitive.
    pub fn parse(id: &str) -> Option<Self> {
        let wanted = id.trim();
        Self::ALL.into_iter().find(|persona| {
            let style = persona.style();
            style.id.eq_ignore_ascii_case(wanted) || style.slug.eq_ignore_ascii_case(wanted)
        })
    }

    /// Lenient lookup; unknown ids map to the default persona.
    pub fn resolve(id: &str) -> Self {
        match Self::parse(id) {
            Some(persona) => persona,
            None => {
                debug!(
                    subsystem = "persona",
                    op = "resolve",
                    requested = id,
                    "Unknown persona id, using default"
                );
                Self::default()
            }
        }
    }

    pub fn style(&self) -> &'static PersonaStyle {
        match self {
            StylePersona::PlainspokenLife => &PLAINSPOKEN_LIFE,
            StylePersona::PlayfulChild => &PLAYFUL_CHILD,
            StylePersona::PossessiveCat => &POSSESSIVE_CAT,
            StylePersona::LiteraryCurator => &LITERARY_CURATOR,
        }
    }

    pub fn id(&self) -> &'static str {
        self.style().id
    }

    /// Ordered few-shot corpus.
    pub fn examples(&self) -> &'static [&'static str] {
        self.style().examples
    }

    /// The first `n` examples split into `(name, description)`.
    pub fn example_pairs(&self, n: usize) -> impl Iterator<Item = (&'static str, &'static str)> {
        self.examples().iter().take(n).map(|example| {
            example
                .split_once('｜')
                .map(|(name, desc)| (name.trim(), desc.trim()))
                .unwrap_or((example.trim(), ""))
        })
    }

    /// Deterministic fallback name for a feature triple.
    pub fn fallback_name(&self, features: &CloudFeatures) -> &'static str {
        let names = self.style().fallback_names;
        let index = (feature_hash(features) % names.len() as u64) as usize;
        names[index]
    }

    /// Persona fallback description filled with the given features.
    ///
    /// Unrecognized features get the image fallback text instead.
    pub fn fallback_description(&self, features: &CloudFeatures) -> String {
        if features.is_unknown() {
            return self.style().image_fallback_description.to_string();
        }
        self.style()
            .fallback_template
            .replace("{shape}", &features.shape)
            .replace("{color}", &features.color)
            .replace("{texture}", &features.texture)
    }

    /// Replace the "current location" placeholder with persona text.
    pub fn personalize_location<'a>(&self, place: &'a str) -> &'a str {
        if place.trim() == defaults::CURRENT_LOCATION_HINT {
            self.style().current_location
        } else {
            place
        }
    }
}

impl fmt::Display for StylePersona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for StylePersona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown persona: {}", s))
    }
}

/// FNV-1a over the feature triple; stable across builds and platforms.
fn feature_hash(features: &CloudFeatures) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET;
    for part in [&features.shape, &features.color, &features.texture] {
        for byte in part.as_bytes().iter().chain(std::iter::once(&0u8)) {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(PRIME);
        }
    }
    hash
}
