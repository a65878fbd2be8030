//! Page language selection and the UI string table.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::BenchmarkApi;
use crate::DashboardError;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Zh,
    En,
    Ko,
}

impl Lang {
    pub const ALL: [Lang; 3] = [Lang::Zh, Lang::En, Lang::Ko];

    pub fn code(self) -> &'static str {
        match self {
            Lang::Zh => "zh",
            Lang::En => "en",
            Lang::Ko => "ko",
        }
    }

    pub fn from_code(code: &str) -> Option<Lang> {
        match code.trim().to_ascii_lowercase().as_str() {
            "zh" => Some(Lang::Zh),
            "en" => Some(Lang::En),
            "ko" => Some(Lang::Ko),
            _ => None,
        }
    }

    /// Name of the language in that language.
    pub fn native_name(self) -> &'static str {
        match self {
            Lang::Zh => "中文",
            Lang::En => "English",
            Lang::Ko => "한국어",
        }
    }

    pub fn texts(self) -> &'static Texts {
        match self {
            Lang::Zh => &ZH,
            Lang::En => &EN,
            Lang::Ko => &KO,
        }
    }

    pub fn start_button_label(self, selected: usize) -> String {
        let base = self.texts().start_eval;
        if selected == 0 {
            return base.to_string();
        }
        match self {
            Lang::Zh => format!("{base} ({selected} 个方法)"),
            Lang::En => format!("{base} ({selected} methods)"),
            Lang::Ko => format!("{base} ({selected}개 방법)"),
        }
    }
}

#[derive(Debug)]
pub struct Texts {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub home: &'static str,
    pub upload: &'static str,
    pub evaluate: &'static str,
    pub results: &'static str,
    pub docs: &'static str,
    pub upload_title: &'static str,
    pub upload_desc: &'static str,
    pub select_file: &'static str,
    pub drag_drop: &'static str,
    pub file_format: &'static str,
    pub download_template: &'static str,
    pub eval_title: &'static str,
    pub eval_desc: &'static str,
    pub select_methods: &'static str,
    pub start_eval: &'static str,
    pub evaluating: &'static str,
    pub uploading: &'static str,
    pub results_title: &'static str,
    pub metrics_title: &'static str,
    pub al_curve_title: &'static str,
    pub radar_title: &'static str,
    pub details_title: &'static str,
    pub export_results: &'static str,
    pub avg_score: &'static str,
    pub n_ir: &'static str,
    pub n_r2: &'static str,
    pub total_sessions: &'static str,
    pub method: &'static str,
    pub doc_format_title: &'static str,
    pub doc_format_desc: &'static str,
    pub doc_metrics_title: &'static str,
    pub doc_metrics_desc: &'static str,
    pub powered_by: &'static str,
}

static ZH: Texts = Texts {
    title: "PersonaSteer Benchmark",
    subtitle: "个性化大语言模型对齐评测平台",
    home: "首页",
    upload: "上传",
    evaluate: "评测",
    results: "结果",
    docs: "文档",
    upload_title: "上传对话日志",
    upload_desc: "上传您的模型生成的对话日志文件 (.jsonl 格式)",
    select_file: "选择文件",
    drag_drop: "或将文件拖拽到此处",
    file_format: "支持的格式: .jsonl",
    download_template: "下载模板",
    eval_title: "开始评测",
    eval_desc: "选择要评测的方法，系统将使用 LLM-as-a-Judge 进行评分",
    select_methods: "选择评测方法",
    start_eval: "开始评测",
    evaluating: "评测中...",
    uploading: "上传中...",
    results_title: "评测结果",
    metrics_title: "核心指标",
    al_curve_title: "AL(k) 对齐曲线",
    radar_title: "多维度对比雷达图",
    details_title: "详细评分",
    export_results: "导出结果",
    avg_score: "平均对齐分数",
    n_ir: "归一化改进率",
    n_r2: "归一化决定系数",
    total_sessions: "评测会话数",
    method: "方法",
    doc_format_title: "数据格式说明",
    doc_format_desc: "上传的 .jsonl 文件应包含以下字段",
    doc_metrics_title: "评测指标说明",
    doc_metrics_desc: "我们使用以下指标评估个性化对齐效果",
    powered_by: "技术支持",
};

static EN: Texts = Texts {
    title: "PersonaSteer Benchmark",
    subtitle: "Personalized LLM Alignment Evaluation Platform",
    home: "Home",
    upload: "Upload",
    evaluate: "Evaluate",
    results: "Results",
    docs: "Documentation",
    upload_title: "Upload Conversation Logs",
    upload_desc: "Upload your model-generated conversation logs (.jsonl format)",
    select_file: "Select File",
    drag_drop: "or drag and drop here",
    file_format: "Supported format: .jsonl",
    download_template: "Download Template",
    eval_title: "Start Evaluation",
    eval_desc: "Select methods to evaluate. The system will use LLM-as-a-Judge for scoring.",
    select_methods: "Select Methods",
    start_eval: "Start Evaluation",
    evaluating: "Evaluating...",
    uploading: "Uploading...",
    results_title: "Evaluation Results",
    metrics_title: "Core Metrics",
    al_curve_title: "AL(k) Alignment Curve",
    radar_title: "Multi-dimensional Comparison Radar",
    details_title: "Detailed Scores",
    export_results: "Export Results",
    avg_score: "Average Alignment Score",
    n_ir: "Normalized Improvement Rate",
    n_r2: "Normalized R-squared",
    total_sessions: "Total Sessions",
    method: "Method",
    doc_format_title: "Data Format Specification",
    doc_format_desc: "The uploaded .jsonl file should contain the following fields",
    doc_metrics_title: "Evaluation Metrics",
    doc_metrics_desc: "We use the following metrics to evaluate personalization alignment",
    powered_by: "Powered by",
};

static KO: Texts = Texts {
    title: "PersonaSteer Benchmark",
    subtitle: "개인화 대규모 언어 모델 정렬 평가 플랫폼",
    home: "홈",
    upload: "업로드",
    evaluate: "평가",
    results: "결과",
    docs: "문서",
    upload_title: "대화 로그 업로드",
    upload_desc: "모델이 생성한 대화 로그 파일을 업로드하세요 (.jsonl 형식)",
    select_file: "파일 선택",
    drag_drop: "또는 여기에 드래그 앤 드롭",
    file_format: "지원 형식: .jsonl",
    download_template: "템플릿 다운로드",
    eval_title: "평가 시작",
    eval_desc: "평가할 방법을 선택하세요. 시스템이 LLM-as-a-Judge를 사용하여 점수를 매깁니다.",
    select_methods: "방법 선택",
    start_eval: "평가 시작",
    evaluating: "평가 중...",
    uploading: "업로드 중...",
    results_title: "평가 결과",
    metrics_title: "핵심 지표",
    al_curve_title: "AL(k) 정렬 곡선",
    radar_title: "다차원 비교 레이더",
    details_title: "상세 점수",
    export_results: "결과 내보내기",
    avg_score: "평균 정렬 점수",
    n_ir: "정규화 개선율",
    n_r2: "정규화 결정계수",
    total_sessions: "총 세션 수",
    method: "방법",
    doc_format_title: "데이터 형식 사양",
    doc_format_desc: "업로드된 .jsonl 파일은 다음 필드를 포함해야 합니다",
    doc_metrics_title: "평가 지표",
    doc_metrics_desc: "개인화 정렬을 평가하기 위해 다음 지표를 사용합니다",
    powered_by: "기술 지원",
};

/// Ask the server to switch the session language.
///
/// Returns `true` when the server accepted the change; the caller is expected
/// to reload the whole page in that case.
pub async fn switch_language<A: BenchmarkApi + ?Sized>(
    api: &A,
    lang: Lang,
) -> Result<bool, DashboardError> {
    match api.set_language(lang).await {
        Ok(true) => {
            info!(lang = lang.code(), "language switched");
            Ok(true)
        }
        Ok(false) => {
            warn!(lang = lang.code(), "server declined language switch");
            Ok(false)
        }
        Err(err) => {
            warn!(lang = lang.code(), "language switch failed: {err}");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for lang in Lang::ALL {
            assert_eq!(Lang::from_code(lang.code()), Some(lang));
        }
        assert_eq!(Lang::from_code(" EN "), Some(Lang::En));
        assert_eq!(Lang::from_code("fr"), None);
    }

    #[test]
    fn start_label_counts_methods() {
        assert_eq!(Lang::Zh.start_button_label(0), "开始评测");
        assert_eq!(Lang::Zh.start_button_label(2), "开始评测 (2 个方法)");
        assert_eq!(Lang::En.start_button_label(3), "Start Evaluation (3 methods)");
    }
}
